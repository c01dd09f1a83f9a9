//! Market observations and regime labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price/volume observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,

    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn default_volume() -> f64 {
    1_000_000.0
}

impl MarketSnapshot {
    pub fn new(price: f64, volume: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            price,
            volume,
            timestamp,
        }
    }
}

/// Coarse label for current market behavior (trend x volatility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    BullVolatile,
    BearVolatile,
    SidewaysVolatile,
    BullStable,
    BearStable,
    RangeBound,
    Trending,
    Neutral,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 8] = [
        MarketRegime::BullVolatile,
        MarketRegime::BearVolatile,
        MarketRegime::SidewaysVolatile,
        MarketRegime::BullStable,
        MarketRegime::BearStable,
        MarketRegime::RangeBound,
        MarketRegime::Trending,
        MarketRegime::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegime::BullVolatile => "bull_volatile",
            MarketRegime::BearVolatile => "bear_volatile",
            MarketRegime::SidewaysVolatile => "sideways_volatile",
            MarketRegime::BullStable => "bull_stable",
            MarketRegime::BearStable => "bear_stable",
            MarketRegime::RangeBound => "range_bound",
            MarketRegime::Trending => "trending",
            MarketRegime::Neutral => "neutral",
        }
    }

    pub fn is_volatile(&self) -> bool {
        matches!(
            self,
            MarketRegime::BullVolatile | MarketRegime::BearVolatile | MarketRegime::SidewaysVolatile
        )
    }
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
