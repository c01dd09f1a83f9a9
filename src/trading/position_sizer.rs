//! Kelly criterion position sizing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Estimate, RiskError};
use crate::models::TradeStatistics;

/// Kelly fraction bounds.
pub const MIN_KELLY_FRACTION: f64 = 0.001;
pub const MAX_KELLY_FRACTION: f64 = 0.05;

/// Risk budget the Kelly bounds were calibrated against. A different
/// `max_portfolio_risk` scales the fraction linearly from here.
pub const REFERENCE_RISK_BUDGET: f64 = 0.02;

/// Result of a Kelly sizing computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellySizing {
    /// Position size in account currency
    pub size: Decimal,

    /// Kelly fraction after clamping
    pub kelly_fraction: f64,

    /// Fraction of balance actually allocated after risk-budget scaling
    pub allocated_fraction: f64,
}

/// Calculator for position sizes.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer;

impl PositionSizer {
    pub fn new() -> Self {
        Self
    }

    /// Kelly criterion position sizing. Unusable statistics fall back to 1%
    /// of balance.
    ///
    /// f* = (p * b - q) / b
    /// where:
    ///   p = probability of winning
    ///   q = probability of losing (1 - p)
    ///   b = ratio of average win to average loss
    ///
    /// f* is clamped to [0.001, 0.05] and scaled by
    /// `max_portfolio_risk / 0.02`.
    pub fn sizing(&self, stats: &TradeStatistics, max_portfolio_risk: f64) -> Estimate<KellySizing> {
        let balance = stats.currency_balance;

        if balance <= Decimal::ZERO {
            warn!(balance = %balance, "Non-positive balance, sizing to zero");
            return Estimate::fallback(
                KellySizing {
                    size: Decimal::ZERO,
                    kelly_fraction: 0.0,
                    allocated_fraction: 0.0,
                },
                RiskError::invalid(format!("balance must be positive, got {balance}")),
            );
        }

        if let Some(reason) = Self::check_inputs(stats, max_portfolio_risk) {
            warn!(%reason, "Invalid sizing inputs, using safe default");
            return Estimate::fallback(
                KellySizing {
                    size: balance * dec!(0.01),
                    kelly_fraction: 0.0,
                    allocated_fraction: 0.01,
                },
                RiskError::invalid(reason),
            );
        }

        let p = stats.win_probability;
        let q = 1.0 - p;
        let b = stats.payoff_ratio();

        let raw_kelly = (b * p - q) / b;
        let kelly = raw_kelly.clamp(MIN_KELLY_FRACTION, MAX_KELLY_FRACTION);

        let adjusted = kelly * max_portfolio_risk / REFERENCE_RISK_BUDGET;
        let size = match Decimal::try_from(adjusted)
            .ok()
            .and_then(|fraction| balance.checked_mul(fraction))
        {
            Some(size) => size,
            None => {
                warn!(balance = %balance, adjusted, "Position size not representable, using safe default");
                return Estimate::fallback(
                    KellySizing {
                        size: balance * dec!(0.01),
                        kelly_fraction: kelly,
                        allocated_fraction: 0.01,
                    },
                    RiskError::invalid(format!(
                        "position size overflows for balance {balance} at fraction {adjusted}"
                    )),
                );
            }
        };

        debug!(
            raw_kelly,
            kelly,
            adjusted,
            size = %size,
            "Kelly position size"
        );

        Estimate::Computed(KellySizing {
            size,
            kelly_fraction: kelly,
            allocated_fraction: adjusted,
        })
    }

    /// Position size in account currency.
    pub fn size(&self, stats: &TradeStatistics, max_portfolio_risk: f64) -> Estimate<Decimal> {
        self.sizing(stats, max_portfolio_risk).map(|s| s.size)
    }

    /// Fixed fraction sizing, used when Kelly sizing is switched off.
    pub fn fixed_fraction_size(&self, balance: Decimal, max_portfolio_risk: f64) -> Decimal {
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let fraction = Decimal::try_from(max_portfolio_risk.clamp(0.0, 1.0))
            .unwrap_or(dec!(0.01));
        balance * fraction
    }

    fn check_inputs(stats: &TradeStatistics, max_portfolio_risk: f64) -> Option<String> {
        if !(stats.avg_loss > 0.0) {
            return Some(format!("average loss must be positive, got {}", stats.avg_loss));
        }
        if !(stats.win_probability > 0.0 && stats.win_probability < 1.0) {
            return Some(format!(
                "win probability must be in (0, 1), got {}",
                stats.win_probability
            ));
        }
        if !(stats.avg_win > 0.0) || !stats.avg_win.is_finite() {
            return Some(format!("average win must be positive, got {}", stats.avg_win));
        }
        if !(max_portfolio_risk > 0.0) || !max_portfolio_risk.is_finite() {
            return Some(format!(
                "max portfolio risk must be positive, got {max_portfolio_risk}"
            ));
        }
        None
    }
}
