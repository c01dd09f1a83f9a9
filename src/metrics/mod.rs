//! Performance metrics from closed trades.

mod calculator;

pub use calculator::MetricsCalculator;
