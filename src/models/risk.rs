//! Market-wide risk report.

use serde::{Deserialize, Serialize};

/// Recommendation tier derived from the overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Multiplier applied to position sizes and the concurrent-trade cap.
    pub fn position_multiplier(&self) -> f64 {
        match self {
            RiskTier::Low => 1.0,
            RiskTier::Medium => 0.8,
            RiskTier::High => 0.5,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Low => "normal operation",
            RiskTier::Medium => "normal caution",
            RiskTier::High => "reduce position sizes",
        }
    }
}

/// Individual risk signals, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub volatility_risk: f64,
    pub concentration_risk: f64,
}

impl RiskFactors {
    pub fn overall(&self) -> f64 {
        ((self.volatility_risk + self.concentration_risk) / 2.0).clamp(0.0, 1.0)
    }
}

/// Aggregate assessment handed to the reporting side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Overall risk in [0, 1]
    pub overall_risk: f64,

    pub factors: RiskFactors,

    pub tier: RiskTier,

    /// Position-size multiplier in (0, 1]
    pub position_multiplier: f64,

    pub max_concurrent_trades: u32,
}
