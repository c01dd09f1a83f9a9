//! Adaptive strategy-parameter tuning.

mod config;
mod regime_table;
mod scorer;
mod search;
mod service;

pub use config::{OptimizerConfig, ScoringTargets};
pub use regime_table::{
    blend_with_regime, predict_performance, regime_adjusted, PerformancePrediction, RegimeMultipliers,
};
pub use scorer::{PerformanceScorer, MAX_SCORE};
pub use search::{CycleReport, CycleStatus, ParameterOptimizer};
pub use service::{CycleInputs, OptimizerHandle, OptimizerService};
