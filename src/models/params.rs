//! Strategy parameter space: named, range-bounded tunables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A tunable strategy parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyParam {
    RsiOversold,
    RsiOverbought,
    StopLossPct,
    TakeProfitPct,
    PositionSizePct,
    ConfidenceThreshold,
    NewsWeight,
    MomentumThreshold,
}

impl StrategyParam {
    pub const ALL: [StrategyParam; 8] = [
        StrategyParam::RsiOversold,
        StrategyParam::RsiOverbought,
        StrategyParam::StopLossPct,
        StrategyParam::TakeProfitPct,
        StrategyParam::PositionSizePct,
        StrategyParam::ConfidenceThreshold,
        StrategyParam::NewsWeight,
        StrategyParam::MomentumThreshold,
    ];

    /// Declared valid range, inclusive.
    pub fn range(&self) -> (f64, f64) {
        match self {
            StrategyParam::RsiOversold => (15.0, 35.0),
            StrategyParam::RsiOverbought => (65.0, 85.0),
            StrategyParam::StopLossPct => (0.015, 0.05),
            StrategyParam::TakeProfitPct => (0.02, 0.08),
            StrategyParam::PositionSizePct => (0.15, 0.35),
            StrategyParam::ConfidenceThreshold => (80.0, 95.0),
            StrategyParam::NewsWeight => (0.1, 0.4),
            StrategyParam::MomentumThreshold => (1.5, 4.0),
        }
    }

    /// Conservative value used when there is no history to tune from.
    pub fn default_value(&self) -> f64 {
        match self {
            StrategyParam::RsiOversold => 25.0,
            StrategyParam::RsiOverbought => 75.0,
            StrategyParam::StopLossPct => 0.025,
            StrategyParam::TakeProfitPct => 0.035,
            StrategyParam::PositionSizePct => 0.25,
            StrategyParam::ConfidenceThreshold => 87.0,
            StrategyParam::NewsWeight => 0.25,
            StrategyParam::MomentumThreshold => 2.5,
        }
    }

    /// Width of the declared range.
    pub fn span(&self) -> f64 {
        let (lo, hi) = self.range();
        hi - lo
    }

    /// Clamp into the declared range. NaN maps to the default value.
    pub fn clamp_value(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default_value();
        }
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyParam::RsiOversold => "rsi_oversold",
            StrategyParam::RsiOverbought => "rsi_overbought",
            StrategyParam::StopLossPct => "stop_loss_pct",
            StrategyParam::TakeProfitPct => "take_profit_pct",
            StrategyParam::PositionSizePct => "position_size_pct",
            StrategyParam::ConfidenceThreshold => "confidence_threshold",
            StrategyParam::NewsWeight => "news_weight",
            StrategyParam::MomentumThreshold => "momentum_threshold",
        }
    }
}

/// A full assignment of every strategy parameter, always within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<StrategyParam, f64>", into = "BTreeMap<StrategyParam, f64>")]
pub struct StrategyParameterSet {
    values: BTreeMap<StrategyParam, f64>,
}

impl StrategyParameterSet {
    /// Build from arbitrary values; missing entries take defaults and every
    /// value is clamped into range.
    pub fn from_values(values: impl IntoIterator<Item = (StrategyParam, f64)>) -> Self {
        let mut set = Self::default();
        for (param, value) in values {
            set.set(param, value);
        }
        set
    }

    pub fn get(&self, param: StrategyParam) -> f64 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value())
    }

    /// Set a parameter, clamped into its declared range.
    pub fn set(&mut self, param: StrategyParam, value: f64) {
        self.values.insert(param, param.clamp_value(value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrategyParam, f64)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    /// Take-profit over stop-loss.
    pub fn reward_risk_ratio(&self) -> f64 {
        self.get(StrategyParam::TakeProfitPct) / self.get(StrategyParam::StopLossPct).max(0.001)
    }

    /// True when every parameter is present and within its declared range.
    pub fn is_within_bounds(&self) -> bool {
        StrategyParam::ALL.iter().all(|p| {
            let (lo, hi) = p.range();
            self.values
                .get(p)
                .is_some_and(|v| *v >= lo && *v <= hi)
        })
    }
}

impl Default for StrategyParameterSet {
    fn default() -> Self {
        Self {
            values: StrategyParam::ALL
                .iter()
                .map(|p| (*p, p.default_value()))
                .collect(),
        }
    }
}

impl From<BTreeMap<StrategyParam, f64>> for StrategyParameterSet {
    fn from(values: BTreeMap<StrategyParam, f64>) -> Self {
        Self::from_values(values)
    }
}

impl From<StrategyParameterSet> for BTreeMap<StrategyParam, f64> {
    fn from(set: StrategyParameterSet) -> Self {
        set.values
    }
}
