//! Market regime detection.

mod detector;

pub use detector::{RegimeDetector, RegimeFeatures, REGIME_WINDOW};
