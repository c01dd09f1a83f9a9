//! Market regime classification from recent price and volume history.

use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::error::{Estimate, RiskError};
use crate::models::{MarketRegime, MarketSnapshot};

/// Observations needed (and used) for one classification.
pub const REGIME_WINDOW: usize = 20;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const HIGH_VOLATILITY: f64 = 0.4;
const LOW_VOLATILITY: f64 = 0.15;
const VOLATILE_TREND_MOVE: f64 = 0.02;
const STABLE_TREND_MOVE: f64 = 0.01;
const HIGH_VOLUME_RATIO: f64 = 1.3;

const RECENT_VOLUME_POINTS: usize = 3;
const AVERAGE_VOLUME_POINTS: usize = 10;

/// Features the classification rules run on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeFeatures {
    /// Annualized standard deviation of log returns
    pub volatility: f64,

    /// Relative price change across the window
    pub price_change: f64,

    /// Recent volume over the longer average
    pub volume_ratio: f64,
}

impl RegimeFeatures {
    /// Apply the rules in order; the first match wins.
    pub fn classify(&self) -> MarketRegime {
        let Self {
            volatility,
            price_change,
            volume_ratio,
        } = *self;

        if volatility > HIGH_VOLATILITY {
            if price_change > VOLATILE_TREND_MOVE {
                MarketRegime::BullVolatile
            } else if price_change < -VOLATILE_TREND_MOVE {
                MarketRegime::BearVolatile
            } else {
                MarketRegime::SidewaysVolatile
            }
        } else if volatility < LOW_VOLATILITY {
            if price_change > STABLE_TREND_MOVE {
                MarketRegime::BullStable
            } else if price_change < -STABLE_TREND_MOVE {
                MarketRegime::BearStable
            } else {
                MarketRegime::RangeBound
            }
        } else if volume_ratio > HIGH_VOLUME_RATIO {
            MarketRegime::Trending
        } else {
            MarketRegime::Neutral
        }
    }
}

/// Classifies recent market history into a [`MarketRegime`].
#[derive(Debug, Clone, Default)]
pub struct RegimeDetector;

impl RegimeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Compute features over the most recent window.
    pub fn features(&self, history: &[MarketSnapshot]) -> Result<RegimeFeatures, RiskError> {
        if history.len() < REGIME_WINDOW {
            return Err(RiskError::insufficient(REGIME_WINDOW, history.len()));
        }

        let window = &history[history.len() - REGIME_WINDOW..];
        let prices: Vec<f64> = window.iter().map(|s| s.price).collect();

        if let Some(bad) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
            return Err(RiskError::invalid(format!(
                "prices must be positive and finite, got {bad}"
            )));
        }

        let log_returns: Vec<f64> = prices
            .windows(2)
            .map(|w| (w[1] / w[0]).ln())
            .collect();
        let volatility = log_returns.iter().population_std_dev() * TRADING_DAYS_PER_YEAR.sqrt();

        let first = prices[0];
        let last = prices[prices.len() - 1];
        let price_change = (last - first) / first;

        let recent_volume = Self::tail_mean(window, RECENT_VOLUME_POINTS);
        let average_volume = Self::tail_mean(window, AVERAGE_VOLUME_POINTS);
        let volume_ratio = recent_volume / average_volume.max(1.0);

        Ok(RegimeFeatures {
            volatility,
            price_change,
            volume_ratio: if volume_ratio.is_finite() { volume_ratio } else { 0.0 },
        })
    }

    /// Detect the current regime. Short or unusable history yields `Neutral`.
    pub fn detect(&self, history: &[MarketSnapshot]) -> Estimate<MarketRegime> {
        match self.features(history) {
            Ok(features) => {
                let regime = features.classify();
                debug!(
                    volatility = features.volatility,
                    price_change = features.price_change,
                    volume_ratio = features.volume_ratio,
                    regime = %regime,
                    "Market regime detected"
                );
                Estimate::Computed(regime)
            }
            Err(reason) => {
                warn!(%reason, "Regime detection fell back to neutral");
                Estimate::fallback(MarketRegime::Neutral, reason)
            }
        }
    }

    fn tail_mean(window: &[MarketSnapshot], n: usize) -> f64 {
        let start = window.len().saturating_sub(n);
        window[start..].iter().map(|s| s.volume).mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn series(prices: &[f64], volumes: &[f64]) -> Vec<MarketSnapshot> {
        let start = Utc::now() - Duration::hours(prices.len() as i64);
        prices
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (p, v))| MarketSnapshot::new(*p, *v, start + Duration::hours(i as i64)))
            .collect()
    }

    fn flat_volume(prices: &[f64]) -> Vec<MarketSnapshot> {
        series(prices, &vec![1000.0; prices.len()])
    }

    /// Alternating between `low` and `high`, starting at `start_high`.
    fn zigzag(n: usize, low: f64, high: f64, start_high: bool) -> Vec<f64> {
        (0..n)
            .map(|i| if (i % 2 == 0) == start_high { high } else { low })
            .collect()
    }

    #[test]
    fn test_bull_stable_on_steady_rise() {
        // +5% total over 20 points with constant log returns
        let prices: Vec<f64> = (0..20)
            .map(|i| 100.0 * 1.05_f64.powf(i as f64 / 19.0))
            .collect();
        let detector = RegimeDetector::new();

        let features = detector.features(&flat_volume(&prices)).unwrap();
        assert!(features.volatility < LOW_VOLATILITY);
        assert!((features.price_change - 0.05).abs() < 1e-9);
        assert_eq!(
            detector.detect(&flat_volume(&prices)),
            Estimate::Computed(MarketRegime::BullStable)
        );
    }

    #[test]
    fn test_bear_stable_and_range_bound() {
        let detector = RegimeDetector::new();

        let falling: Vec<f64> = (0..20)
            .map(|i| 100.0 * 0.95_f64.powf(i as f64 / 19.0))
            .collect();
        assert_eq!(
            *detector.detect(&flat_volume(&falling)).value(),
            MarketRegime::BearStable
        );

        let flat = vec![100.0; 25];
        assert_eq!(
            *detector.detect(&flat_volume(&flat)).value(),
            MarketRegime::RangeBound
        );
    }

    #[test]
    fn test_volatile_regimes() {
        let detector = RegimeDetector::new();

        // ends on the high leg: +10%
        let up = zigzag(20, 100.0, 110.0, false);
        assert_eq!(*detector.detect(&flat_volume(&up)).value(), MarketRegime::BullVolatile);

        // ends on the low leg: -9%
        let down = zigzag(20, 100.0, 110.0, true);
        assert_eq!(*detector.detect(&flat_volume(&down)).value(), MarketRegime::BearVolatile);

        // swings but finishes where it started
        let mut sideways = zigzag(19, 100.0, 110.0, false);
        sideways.push(100.0);
        assert_eq!(
            *detector.detect(&flat_volume(&sideways)).value(),
            MarketRegime::SidewaysVolatile
        );
    }

    #[test]
    fn test_trending_needs_volume_surge() {
        let detector = RegimeDetector::new();
        // ~1.5% swings: annualized volatility between the two thresholds
        let prices = zigzag(20, 100.0, 101.5, false);

        let mut volumes = vec![1000.0; 17];
        volumes.extend([2000.0, 2000.0, 2000.0]);
        let surging = series(&prices, &volumes);

        let features = detector.features(&surging).unwrap();
        assert!(features.volatility > LOW_VOLATILITY && features.volatility < HIGH_VOLATILITY);
        assert!((features.volume_ratio - 2000.0 / 1300.0).abs() < 1e-9);
        assert_eq!(*detector.detect(&surging).value(), MarketRegime::Trending);

        assert_eq!(*detector.detect(&flat_volume(&prices)).value(), MarketRegime::Neutral);
    }

    #[test]
    fn test_only_last_window_counts() {
        let detector = RegimeDetector::new();
        // a crash long ago followed by 20 flat points
        let mut prices = vec![500.0, 50.0, 400.0, 20.0];
        prices.extend(vec![100.0; 20]);
        assert_eq!(
            *detector.detect(&flat_volume(&prices)).value(),
            MarketRegime::RangeBound
        );
    }

    #[test]
    fn test_insufficient_history() {
        let detector = RegimeDetector::new();
        let prices = vec![100.0; 19];
        let result = detector.detect(&flat_volume(&prices));
        assert_eq!(
            result,
            Estimate::fallback(MarketRegime::Neutral, RiskError::insufficient(20, 19))
        );
        assert!(detector.detect(&[]).is_fallback());
    }

    #[test]
    fn test_invalid_prices_fall_back() {
        let detector = RegimeDetector::new();
        let mut prices = vec![100.0; 20];
        prices[7] = 0.0;
        let result = detector.detect(&flat_volume(&prices));
        assert_eq!(*result.value(), MarketRegime::Neutral);
        assert!(matches!(result.reason(), Some(RiskError::InvalidInput(_))));
    }

    #[test]
    fn test_rule_order() {
        let f = |volatility, price_change, volume_ratio| RegimeFeatures {
            volatility,
            price_change,
            volume_ratio,
        };
        // volatility rules shadow the volume rule
        assert_eq!(f(0.5, 0.0, 5.0).classify(), MarketRegime::SidewaysVolatile);
        assert_eq!(f(0.1, 0.0, 5.0).classify(), MarketRegime::RangeBound);
        assert_eq!(f(0.2, 0.5, 1.31).classify(), MarketRegime::Trending);
        assert_eq!(f(0.2, 0.5, 1.3).classify(), MarketRegime::Neutral);
        // boundaries are strict
        assert_eq!(f(0.4, 0.05, 1.0).classify(), MarketRegime::Neutral);
        assert_eq!(f(0.15, 0.05, 1.0).classify(), MarketRegime::Neutral);
    }
}
