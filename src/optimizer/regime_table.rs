//! Per-regime parameter adjustments and performance expectations.

use serde::Serialize;

use crate::models::{MarketRegime, StrategyParam, StrategyParameterSet};

/// Multipliers applied to the regime-sensitive parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeMultipliers {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub confidence: f64,
}

impl RegimeMultipliers {
    pub const IDENTITY: RegimeMultipliers = RegimeMultipliers {
        stop_loss: 1.0,
        take_profit: 1.0,
        position_size: 1.0,
        confidence: 1.0,
    };

    pub fn for_regime(regime: MarketRegime) -> Self {
        let (stop_loss, take_profit, position_size, confidence) = match regime {
            // wider stops, higher targets, smaller size
            MarketRegime::BullVolatile => (1.3, 1.5, 0.8, 1.1),
            // take profits quickly
            MarketRegime::BearVolatile => (1.2, 0.8, 0.7, 1.15),
            MarketRegime::BullStable => (0.8, 1.2, 1.1, 0.9),
            MarketRegime::BearStable => (0.9, 0.9, 0.9, 1.05),
            // tight scalps
            MarketRegime::RangeBound => (0.7, 0.8, 1.2, 0.85),
            MarketRegime::Trending => (1.1, 1.3, 1.0, 0.95),
            MarketRegime::SidewaysVolatile | MarketRegime::Neutral => return Self::IDENTITY,
        };
        Self {
            stop_loss,
            take_profit,
            position_size,
            confidence,
        }
    }

    fn pairs(&self) -> [(StrategyParam, f64); 4] {
        [
            (StrategyParam::StopLossPct, self.stop_loss),
            (StrategyParam::TakeProfitPct, self.take_profit),
            (StrategyParam::PositionSizePct, self.position_size),
            (StrategyParam::ConfidenceThreshold, self.confidence),
        ]
    }
}

/// `base` with the regime multipliers applied, clamped into range.
pub fn regime_adjusted(base: &StrategyParameterSet, regime: MarketRegime) -> StrategyParameterSet {
    let mut adjusted = base.clone();
    for (param, multiplier) in RegimeMultipliers::for_regime(regime).pairs() {
        adjusted.set(param, base.get(param) * multiplier);
    }
    adjusted
}

/// Weighted average of a search result and its regime-adjusted version,
/// re-clamped into range.
pub fn blend_with_regime(
    searched: &StrategyParameterSet,
    regime: MarketRegime,
    search_weight: f64,
) -> StrategyParameterSet {
    let w = search_weight.clamp(0.0, 1.0);
    let regime_params = regime_adjusted(searched, regime);

    StrategyParameterSet::from_values(
        StrategyParam::ALL
            .iter()
            .map(|p| (*p, searched.get(*p) * w + regime_params.get(*p) * (1.0 - w))),
    )
}

/// Expected performance for a parameter set in a given regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePrediction {
    pub monthly_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,

    /// 1 (calm) to 10 (dangerous)
    pub risk_score: f64,
}

const BASE_MONTHLY_RETURN: f64 = 0.15;
const BASE_WIN_RATE: f64 = 0.70;
const BASE_SHARPE: f64 = 1.5;
const BASE_DRAWDOWN: f64 = 0.08;

/// (return, win rate, drawdown) multipliers.
fn prediction_multipliers(regime: MarketRegime) -> (f64, f64, f64) {
    match regime {
        MarketRegime::BullVolatile => (1.3, 0.9, 1.4),
        MarketRegime::BullStable => (1.2, 1.1, 0.8),
        MarketRegime::BearVolatile => (0.7, 0.85, 1.6),
        MarketRegime::BearStable => (0.8, 0.95, 1.1),
        MarketRegime::RangeBound => (1.1, 1.05, 0.7),
        MarketRegime::Trending => (1.25, 1.0, 1.0),
        MarketRegime::SidewaysVolatile | MarketRegime::Neutral => (1.0, 1.0, 1.0),
    }
}

pub fn predict_performance(params: &StrategyParameterSet, regime: MarketRegime) -> PerformancePrediction {
    let mut monthly_return = BASE_MONTHLY_RETURN;
    let mut win_rate = BASE_WIN_RATE;
    let mut sharpe = BASE_SHARPE;

    // stricter entries: fewer but better trades
    if params.get(StrategyParam::ConfidenceThreshold) > 90.0 {
        win_rate *= 1.1;
        monthly_return *= 0.95;
    }

    if params.reward_risk_ratio() > 1.5 {
        monthly_return *= 1.15;
        sharpe *= 1.1;
    }

    let (ret_mult, win_mult, dd_mult) = prediction_multipliers(regime);
    let predicted_return = monthly_return * ret_mult;
    let predicted_win_rate = win_rate * win_mult;
    let predicted_drawdown = BASE_DRAWDOWN * dd_mult;
    let predicted_sharpe = sharpe
        * (predicted_return / monthly_return)
        * (win_rate / predicted_win_rate.max(0.5));

    let risk_score = (predicted_drawdown * 50.0
        + (0.3 - predicted_win_rate).max(0.0) * 20.0
        + (2.0 - predicted_sharpe).max(0.0) * 10.0)
        .clamp(1.0, 10.0);

    PerformancePrediction {
        monthly_return: predicted_return,
        win_rate: predicted_win_rate.min(0.95),
        sharpe_ratio: predicted_sharpe,
        max_drawdown: predicted_drawdown,
        risk_score,
    }
}
