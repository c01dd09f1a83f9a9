//! Strategy performance metrics derived from closed trades.

use serde::{Deserialize, Serialize};

/// Performance of a strategy over a window of closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Total return relative to the base capital (0.25 = 25%)
    pub total_return: f64,

    /// Mean return over return volatility
    pub sharpe_ratio: f64,

    /// Peak-to-trough decline of the equity curve as a fraction of the peak (0.0 to 1.0)
    pub max_drawdown: f64,

    /// Win rate (0.0 to 1.0)
    pub win_rate: f64,

    /// Net profit over gross loss (gross loss floored at 1)
    pub profit_factor: f64,

    /// Average holding time in minutes
    pub avg_trade_duration: f64,

    /// Total profit over the worst loss (floored at 100)
    pub risk_adjusted_return: f64,

    /// How steady the win stream is (0.0 to 1.0)
    pub consistency_score: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            total_return: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_trade_duration: 0.0,
            risk_adjusted_return: 0.0,
            consistency_score: 0.0,
        }
    }
}
