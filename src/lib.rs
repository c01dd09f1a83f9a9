//! Risk-adjusted decision engine.
//!
//! Sizes positions with a clamped Kelly criterion, places volatility- and
//! timeframe-aware stops, gates entries on portfolio correlation, grades
//! market-wide risk, classifies the market regime and tunes strategy
//! parameters in the background.

pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod regime;
pub mod trading;

pub use engine::{EntryRequest, EntryValidation, RiskEngine, RiskProfile};
pub use error::{Estimate, RiskError};
pub use models::{
    classify, AssetClass, MarketRegime, MarketSnapshot, OrderPlan, PerformanceMetrics, Position,
    RiskReport, RiskTier, StrategyParam, StrategyParameterSet, TradeDirection, TradeOutcome,
    TradeStatistics,
};
pub use optimizer::{OptimizerConfig, OptimizerService, ParameterOptimizer, PerformanceScorer};
pub use regime::RegimeDetector;
pub use trading::{
    CorrelationGate, CorrelationStore, MarketRiskAssessor, PositionSizer, RiskConfig,
    StopLossCalculator, TrailingStopTracker,
};
