//! Dynamic stop-loss distance and trailing-stop prices.

use tracing::debug;

use crate::models::{classify, AssetClass, TradeDirection};

pub const MIN_STOP_LOSS_FRACTION: f64 = 0.003;
pub const MAX_STOP_LOSS_FRACTION: f64 = 0.05;

/// Volatility the base stops are calibrated for.
const REFERENCE_VOLATILITY: f64 = 0.02;

/// Chart timeframe used to scale the stop distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    Unknown,
}

impl Timeframe {
    /// Parse labels like `1m`, `15min`, `1h`, `4H`, `1d`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "1m" | "1min" => Timeframe::OneMinute,
            "5m" | "5min" => Timeframe::FiveMinutes,
            "15m" | "15min" => Timeframe::FifteenMinutes,
            "30m" | "30min" => Timeframe::ThirtyMinutes,
            "1h" | "60m" => Timeframe::OneHour,
            "4h" => Timeframe::FourHours,
            "1d" | "24h" => Timeframe::OneDay,
            _ => Timeframe::Unknown,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Timeframe::OneMinute => 0.3,
            Timeframe::FiveMinutes => 0.5,
            Timeframe::FifteenMinutes => 0.7,
            Timeframe::ThirtyMinutes => 0.8,
            Timeframe::OneHour | Timeframe::Unknown => 1.0,
            Timeframe::FourHours => 1.5,
            Timeframe::OneDay => 2.0,
        }
    }
}

/// Calculator for volatility- and timeframe-adjusted stop distances.
#[derive(Debug, Clone, Default)]
pub struct StopLossCalculator;

impl StopLossCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Stop distance before volatility and timeframe scaling.
    pub fn base_fraction(class: AssetClass) -> f64 {
        match class {
            AssetClass::Crypto => 0.015,
            AssetClass::Forex => 0.008,
            AssetClass::Stock => 0.012,
            AssetClass::Commodity => 0.02,
        }
    }

    /// Scale factor in [0.5, 3.0]. Negative or non-finite volatility counts as zero.
    pub fn volatility_multiplier(volatility: f64) -> f64 {
        let volatility = if volatility.is_finite() {
            volatility.max(0.0)
        } else {
            0.0
        };
        (volatility / REFERENCE_VOLATILITY).clamp(0.5, 3.0)
    }

    /// Stop-loss distance as a fraction of entry price, in [0.003, 0.05].
    pub fn stop_loss_fraction(&self, asset: &str, volatility: f64, timeframe: &str) -> f64 {
        let class = classify(asset);
        let base = Self::base_fraction(class);
        let vol_mult = Self::volatility_multiplier(volatility);
        let tf_mult = Timeframe::parse(timeframe).multiplier();

        let fraction =
            (base * vol_mult * tf_mult).clamp(MIN_STOP_LOSS_FRACTION, MAX_STOP_LOSS_FRACTION);

        debug!(
            asset,
            class = class.as_str(),
            vol_mult,
            tf_mult,
            fraction,
            "Dynamic stop loss"
        );

        fraction
    }

    /// Absolute stop price `fraction` away from entry, against the position.
    pub fn stop_loss_price(entry_price: f64, fraction: f64, direction: TradeDirection) -> f64 {
        match direction {
            TradeDirection::Buy => entry_price * (1.0 - fraction),
            TradeDirection::Sell => entry_price * (1.0 + fraction),
        }
    }
}

/// Trailing-stop price computation.
///
/// `update` is stateless: every call recomputes from the current price. Use
/// `ratchet` to keep the best stop across calls for the same position.
#[derive(Debug, Clone, Default)]
pub struct TrailingStopTracker;

impl TrailingStopTracker {
    pub fn new() -> Self {
        Self
    }

    /// Trailing stop for the current price. The stop never sits further than
    /// twice the trail distance from entry.
    pub fn update(
        &self,
        entry_price: f64,
        current_price: f64,
        direction: TradeDirection,
        trail_distance: f64,
    ) -> f64 {
        match direction {
            TradeDirection::Buy => {
                let candidate = current_price * (1.0 - trail_distance);
                let floor = entry_price * (1.0 - 2.0 * trail_distance);
                candidate.max(floor)
            }
            TradeDirection::Sell => {
                let candidate = current_price * (1.0 + trail_distance);
                let ceiling = entry_price * (1.0 + 2.0 * trail_distance);
                candidate.min(ceiling)
            }
        }
    }

    /// The more favorable of a previously held stop and a fresh one: higher
    /// for longs, lower for shorts.
    pub fn ratchet(previous: Option<f64>, candidate: f64, direction: TradeDirection) -> f64 {
        match (previous, direction) {
            (None, _) => candidate,
            (Some(prev), TradeDirection::Buy) => prev.max(candidate),
            (Some(prev), TradeDirection::Sell) => prev.min(candidate),
        }
    }
}
