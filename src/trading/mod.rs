//! Trading risk logic: position sizing, stops, correlation gating, market risk.

mod assessor;
mod config;
mod correlation;
mod position_sizer;
mod stop_loss;

pub use assessor::MarketRiskAssessor;
pub use config::RiskConfig;
pub use correlation::{
    CorrelationEntry, CorrelationGate, CorrelationStore, CorrelationTable, GateDecision,
    CROSS_CLASS_CORRELATION, SAME_CLASS_CORRELATION,
};
pub use position_sizer::{
    KellySizing, PositionSizer, MAX_KELLY_FRACTION, MIN_KELLY_FRACTION, REFERENCE_RISK_BUDGET,
};
pub use stop_loss::{
    StopLossCalculator, Timeframe, TrailingStopTracker, MAX_STOP_LOSS_FRACTION,
    MIN_STOP_LOSS_FRACTION,
};
