//! Trade direction, closed-trade outcomes and the statistics fed to sizing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Estimate;
use crate::metrics::MetricsCalculator;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "BUY",
            TradeDirection::Sell => "SELL",
        }
    }

    /// Parse a direction string. Anything other than a sell is a buy.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SELL" | "SHORT" => TradeDirection::Sell,
            _ => TradeDirection::Buy,
        }
    }
}

/// A closed trade as reported by the trade-history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// Realized profit in account currency (negative for a loss)
    pub profit: Decimal,

    /// Return of the trade in percent
    #[serde(default)]
    pub return_pct: f64,

    /// Holding time in minutes
    #[serde(default = "default_duration")]
    pub duration_minutes: f64,
}

fn default_duration() -> f64 {
    30.0
}

impl TradeOutcome {
    pub fn new(profit: Decimal, return_pct: f64, duration_minutes: f64) -> Self {
        Self {
            profit,
            return_pct,
            duration_minutes,
        }
    }

    pub fn is_win(&self) -> bool {
        self.profit > Decimal::ZERO
    }
}

/// Inputs to Kelly sizing, built per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    /// Probability of a winning trade, expected in (0, 1)
    pub win_probability: f64,

    /// Average gain on a winning trade
    pub avg_win: f64,

    /// Average loss on a losing trade (absolute value)
    pub avg_loss: f64,

    /// Capital available for sizing
    pub currency_balance: Decimal,
}

impl TradeStatistics {
    pub fn new(win_probability: f64, avg_win: f64, avg_loss: f64, currency_balance: Decimal) -> Self {
        Self {
            win_probability,
            avg_win,
            avg_loss,
            currency_balance,
        }
    }

    /// Statistics derived from closed trades. See
    /// [`MetricsCalculator::trade_statistics`](crate::metrics::MetricsCalculator::trade_statistics).
    pub fn from_outcomes(outcomes: &[TradeOutcome], balance: Decimal) -> Estimate<Self> {
        MetricsCalculator::trade_statistics(outcomes, balance)
    }

    /// Payoff ratio b = avg_win / avg_loss.
    pub fn payoff_ratio(&self) -> f64 {
        self.avg_win / self.avg_loss
    }

    /// Describe the first problem with these statistics, if any.
    pub fn validate(&self) -> Option<String> {
        if self.currency_balance <= Decimal::ZERO {
            return Some(format!("balance must be positive, got {}", self.currency_balance));
        }
        if !(self.win_probability > 0.0 && self.win_probability < 1.0) {
            return Some(format!(
                "win probability must be in (0, 1), got {}",
                self.win_probability
            ));
        }
        if !(self.avg_loss > 0.0) {
            return Some(format!("average loss must be positive, got {}", self.avg_loss));
        }
        if !(self.avg_win > 0.0) {
            return Some(format!("average win must be positive, got {}", self.avg_win));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_parse() {
        assert_eq!(TradeDirection::parse("sell"), TradeDirection::Sell);
        assert_eq!(TradeDirection::parse("BUY"), TradeDirection::Buy);
        assert_eq!(TradeDirection::parse("long"), TradeDirection::Buy);
        assert_eq!(TradeDirection::Sell.as_str(), "SELL");
    }

    #[test]
    fn test_validate_statistics() {
        let ok = TradeStatistics::new(0.6, 0.02, 0.01, dec!(1000));
        assert!(ok.validate().is_none());
        assert!((ok.payoff_ratio() - 2.0).abs() < 1e-12);

        let bad_p = TradeStatistics::new(1.0, 0.02, 0.01, dec!(1000));
        assert!(bad_p.validate().unwrap().contains("win probability"));

        let bad_loss = TradeStatistics::new(0.6, 0.02, 0.0, dec!(1000));
        assert!(bad_loss.validate().unwrap().contains("average loss"));

        let bad_balance = TradeStatistics::new(0.6, 0.02, 0.01, dec!(-5));
        assert!(bad_balance.validate().unwrap().contains("balance"));
    }

    #[test]
    fn test_from_outcomes() {
        let outcomes = vec![
            TradeOutcome::new(dec!(30), 3.0, 20.0),
            TradeOutcome::new(dec!(10), 1.0, 20.0),
            TradeOutcome::new(dec!(-20), -2.0, 20.0),
        ];
        let stats = TradeStatistics::from_outcomes(&outcomes, dec!(1000));
        assert!(!stats.is_fallback());
        let stats = stats.into_value();
        assert!((stats.win_probability - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_win - 0.02).abs() < 1e-12);
        assert!((stats.avg_loss - 0.02).abs() < 1e-12);

        // no losses: payoff ratio undefined
        let all_wins = vec![TradeOutcome::new(dec!(5), 0.5, 10.0)];
        assert!(TradeStatistics::from_outcomes(&all_wins, dec!(1000)).is_fallback());
    }

    #[test]
    fn test_outcome_deserialize_defaults() {
        let outcome: TradeOutcome = serde_json::from_str(r#"{"profit": "12.5"}"#).unwrap();
        assert!(outcome.is_win());
        assert_eq!(outcome.duration_minutes, 30.0);
        assert_eq!(outcome.return_pct, 0.0);
    }
}
