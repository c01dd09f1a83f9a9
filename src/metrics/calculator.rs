//! Calculator for strategy performance metrics and sizing statistics from
//! closed trade outcomes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::error::{Estimate, RiskError};
use crate::models::{PerformanceMetrics, TradeOutcome, TradeStatistics};

/// Floor for the return volatility in the Sharpe-like ratio.
const MIN_RETURN_STD: f64 = 0.001;

/// Floor for the worst loss in the risk-adjusted return.
const MIN_LOSS_FOR_RISK_ADJUSTMENT: f64 = 100.0;

/// Calculator for performance metrics.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Metrics over a window of closed trades, measured against `base_capital`.
    pub fn calculate(outcomes: &[TradeOutcome], base_capital: f64) -> PerformanceMetrics {
        let mut metrics = PerformanceMetrics::default();

        if outcomes.is_empty() || base_capital <= 0.0 {
            return metrics;
        }

        let profits: Vec<f64> = outcomes
            .iter()
            .map(|o| o.profit.to_f64().unwrap_or(0.0))
            .collect();

        let wins = profits.iter().filter(|&&p| p > 0.0).count();
        metrics.win_rate = wins as f64 / outcomes.len() as f64;

        let total_profit: f64 = profits.iter().sum();
        metrics.total_return = total_profit / base_capital;

        // Profit factor
        let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
        metrics.profit_factor = (total_profit / gross_loss.max(1.0)).abs();

        let worst_loss = profits
            .iter()
            .copied()
            .filter(|&p| p < 0.0)
            .fold(0.0_f64, f64::min);
        metrics.risk_adjusted_return =
            total_profit / worst_loss.abs().max(MIN_LOSS_FOR_RISK_ADJUSTMENT);

        metrics.max_drawdown = Self::max_drawdown(&profits, base_capital);
        metrics.sharpe_ratio = Self::sharpe_like(outcomes);

        metrics.avg_trade_duration = outcomes
            .iter()
            .map(|o| o.duration_minutes)
            .collect::<Vec<_>>()
            .mean();

        metrics.consistency_score = (metrics.win_rate * 1.2).min(1.0);

        metrics
    }

    /// Peak-to-trough decline of the equity curve starting at `base_capital`,
    /// as a fraction of the peak.
    fn max_drawdown(profits: &[f64], base_capital: f64) -> f64 {
        let mut equity = base_capital;
        let mut peak = base_capital;
        let mut max_dd = 0.0f64;

        for pnl in profits {
            equity += pnl;

            if equity > peak {
                peak = equity;
            }

            if peak > 0.0 {
                let dd = (peak - equity) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }

        max_dd.clamp(0.0, 1.0)
    }

    /// Mean return over its population standard deviation (not annualized).
    fn sharpe_like(outcomes: &[TradeOutcome]) -> f64 {
        let returns: Vec<f64> = outcomes.iter().map(|o| o.return_pct).collect();
        if returns.is_empty() {
            return 0.0;
        }

        let mean = returns.iter().mean();
        let std_dev = returns.iter().population_std_dev();
        if !std_dev.is_finite() {
            return 0.0;
        }

        mean / std_dev.max(MIN_RETURN_STD)
    }

    /// Win probability and average win/loss (as return fractions) for Kelly
    /// sizing. Falls back when the history lacks wins or losses.
    pub fn trade_statistics(
        outcomes: &[TradeOutcome],
        balance: Decimal,
    ) -> Estimate<TradeStatistics> {
        let (wins, losses): (Vec<_>, Vec<_>) = outcomes.iter().partition(|o| o.is_win());

        let win_probability = if outcomes.is_empty() {
            0.0
        } else {
            wins.len() as f64 / outcomes.len() as f64
        };

        let avg_win = if wins.is_empty() {
            0.0
        } else {
            wins.iter().map(|o| o.return_pct.abs() / 100.0).sum::<f64>() / wins.len() as f64
        };
        let avg_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().map(|o| o.return_pct.abs() / 100.0).sum::<f64>() / losses.len() as f64
        };

        let stats = TradeStatistics::new(win_probability, avg_win, avg_loss, balance);

        if outcomes.is_empty() {
            return Estimate::fallback(stats, RiskError::insufficient(1, 0));
        }
        match stats.validate() {
            None => Estimate::Computed(stats),
            Some(reason) => Estimate::fallback(stats, RiskError::invalid(reason)),
        }
    }
}
