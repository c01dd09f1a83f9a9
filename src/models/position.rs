//! Open positions and the order plan handed to the execution layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeDirection;

/// An open position, owned by the order-management side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ticker symbol
    pub asset: String,

    /// Long or short
    pub direction: TradeDirection,

    /// Fill price at entry
    pub entry_price: f64,

    /// Position size in account currency
    pub size: Decimal,

    /// Stop-loss distance as a fraction of entry price
    pub stop_loss_pct: f64,

    /// When the position was opened
    #[serde(default = "Utc::now")]
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn new(
        asset: impl Into<String>,
        direction: TradeDirection,
        entry_price: f64,
        size: Decimal,
        stop_loss_pct: f64,
    ) -> Self {
        Self {
            asset: asset.into(),
            direction,
            entry_price,
            size,
            stop_loss_pct,
            opened_at: Utc::now(),
        }
    }

    /// Return of the position at `current_price`, signed by direction.
    pub fn return_pct(&self, current_price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        match self.direction {
            TradeDirection::Buy => (current_price - self.entry_price) / self.entry_price,
            TradeDirection::Sell => (self.entry_price - current_price) / self.entry_price,
        }
    }
}

/// Everything the execution layer needs to place a risk-checked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlan {
    pub asset: String,
    pub direction: TradeDirection,

    /// Size in account currency
    pub size: Decimal,

    /// Stop distance as a fraction of entry
    pub stop_loss_pct: f64,

    /// Absolute stop-loss price
    pub stop_loss_price: f64,

    /// Initial trailing-stop price
    pub trailing_stop_price: f64,
}

impl OrderPlan {
    /// Turn the plan into a position record once it has been filled.
    pub fn into_position(self, entry_price: f64) -> Position {
        Position::new(
            self.asset,
            self.direction,
            entry_price,
            self.size,
            self.stop_loss_pct,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_return_pct_by_direction() {
        let long = Position::new("BTC", TradeDirection::Buy, 100.0, dec!(50), 0.02);
        assert!((long.return_pct(110.0) - 0.10).abs() < 1e-12);

        let short = Position::new("BTC", TradeDirection::Sell, 100.0, dec!(50), 0.02);
        assert!((short.return_pct(90.0) - 0.10).abs() < 1e-12);
        assert!(short.return_pct(110.0) < 0.0);
    }

    #[test]
    fn test_plan_into_position() {
        let plan = OrderPlan {
            asset: "ETH".to_string(),
            direction: TradeDirection::Buy,
            size: dec!(250),
            stop_loss_pct: 0.02,
            stop_loss_price: 1960.0,
            trailing_stop_price: 1980.0,
        };
        let pos = plan.into_position(2000.0);
        assert_eq!(pos.asset, "ETH");
        assert_eq!(pos.size, dec!(250));
        assert_eq!(pos.stop_loss_pct, 0.02);
    }
}
