//! Risk configuration.

use serde::{Deserialize, Serialize};

/// Configuration for sizing, stops and portfolio gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of the portfolio risked per trade (0.0 to 1.0)
    pub max_portfolio_risk: f64,

    /// Cap on concurrent trades before the risk multiplier is applied
    pub max_concurrent_trades: u32,

    /// Scale stop-loss distance with volatility and timeframe
    pub dynamic_stop_loss: bool,

    /// Size positions with the Kelly criterion
    pub kelly_position_sizing: bool,

    /// Reject candidates correlated with too many open positions
    pub correlation_check: bool,

    /// Adjust risk by market volatility
    pub volatility_adjustment: bool,

    /// Correlation above which two assets count as "highly correlated"
    pub high_correlation_threshold: f64,

    /// Number of highly correlated open positions that triggers a rejection
    pub max_correlated_positions: usize,

    /// Below this many open positions the correlation gate always admits
    pub min_positions_for_correlation_check: usize,

    /// Default trailing-stop distance as a fraction of price
    pub trail_distance: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_portfolio_risk: 0.02,          // 2% per trade
            max_concurrent_trades: 15,
            dynamic_stop_loss: true,
            kelly_position_sizing: true,
            correlation_check: true,
            volatility_adjustment: true,
            high_correlation_threshold: 0.7,
            max_correlated_positions: 2,
            min_positions_for_correlation_check: 3,
            trail_distance: 0.01,              // 1% trail
        }
    }
}

impl RiskConfig {
    /// Names of the protections currently switched on.
    pub fn active_protections(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.kelly_position_sizing {
            active.push("Kelly Criterion Position Sizing");
        }
        if self.dynamic_stop_loss {
            active.push("Dynamic Stop Loss");
        }
        if self.correlation_check {
            active.push("Correlation-Based Diversification");
        }
        if self.volatility_adjustment {
            active.push("Volatility-Adjusted Risk");
        }
        active.push("Trailing Stop Loss");
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_protections() {
        let config = RiskConfig::default();
        assert_eq!(config.active_protections().len(), 5);

        let config = RiskConfig {
            correlation_check: false,
            ..Default::default()
        };
        assert!(!config
            .active_protections()
            .contains(&"Correlation-Based Diversification"));
    }
}
