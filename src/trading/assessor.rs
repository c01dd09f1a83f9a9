//! Market-wide risk assessment.

use tracing::debug;

use crate::models::{RiskFactors, RiskReport, RiskTier};

/// Aggregates volatility and concentration into a single risk report.
#[derive(Debug, Clone)]
pub struct MarketRiskAssessor {
    base_max_concurrent_trades: u32,
}

impl MarketRiskAssessor {
    pub fn new(base_max_concurrent_trades: u32) -> Self {
        Self {
            base_max_concurrent_trades,
        }
    }

    pub fn volatility_risk(avg_volatility: f64) -> f64 {
        if avg_volatility > 0.05 {
            0.8
        } else if avg_volatility > 0.03 {
            0.4
        } else {
            0.1
        }
    }

    pub fn concentration_risk(active_markets: u32) -> f64 {
        if active_markets < 3 {
            0.7
        } else if active_markets < 5 {
            0.3
        } else {
            0.1
        }
    }

    pub fn tier(overall_risk: f64) -> RiskTier {
        if overall_risk > 0.6 {
            RiskTier::High
        } else if overall_risk > 0.3 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn assess(&self, avg_volatility: f64, active_markets: u32) -> RiskReport {
        let factors = RiskFactors {
            volatility_risk: Self::volatility_risk(avg_volatility),
            concentration_risk: Self::concentration_risk(active_markets),
        };
        let overall_risk = factors.overall();
        let tier = Self::tier(overall_risk);
        let position_multiplier = tier.position_multiplier();
        let max_concurrent_trades =
            (self.base_max_concurrent_trades as f64 * position_multiplier).floor() as u32;

        debug!(
            avg_volatility,
            active_markets,
            overall_risk,
            tier = ?tier,
            "Market risk assessed"
        );

        RiskReport {
            overall_risk,
            factors,
            tier,
            position_multiplier,
            max_concurrent_trades,
        }
    }
}

impl Default for MarketRiskAssessor {
    fn default() -> Self {
        Self::new(15)
    }
}
