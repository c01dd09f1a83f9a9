//! Data models for trades, positions, market data, parameters and reports.

mod asset;
mod market;
mod metrics;
mod params;
mod position;
mod risk;
mod trade;

pub use asset::{classify, matching_rule, normalize_symbol, AssetClass, ClassificationRule};
pub use market::{MarketRegime, MarketSnapshot};
pub use metrics::PerformanceMetrics;
pub use params::{StrategyParam, StrategyParameterSet};
pub use position::{OrderPlan, Position};
pub use risk::{RiskFactors, RiskReport, RiskTier};
pub use trade::{TradeDirection, TradeOutcome, TradeStatistics};
