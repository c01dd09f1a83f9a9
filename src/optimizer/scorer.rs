//! Composite performance score used as the optimizer's fitness.

use crate::models::PerformanceMetrics;

use super::ScoringTargets;

pub const MAX_SCORE: f64 = 2.0;

/// Cap on each ratio-to-target component.
const COMPONENT_CAP: f64 = 2.0;

const RETURN_WEIGHT: f64 = 0.30;
const SHARPE_WEIGHT: f64 = 0.25;
const DRAWDOWN_WEIGHT: f64 = 0.20;
const WIN_RATE_WEIGHT: f64 = 0.15;
const CONSISTENCY_WEIGHT: f64 = 0.10;

/// Weighted score in [0, 2].
///
/// Weights:
/// - Return vs target: 30%
/// - Sharpe-like ratio vs target: 25%
/// - Drawdown below tolerance: 20%
/// - Win rate vs target: 15%
/// - Consistency: 10%
#[derive(Debug, Clone, Default)]
pub struct PerformanceScorer {
    targets: ScoringTargets,
}

impl PerformanceScorer {
    pub fn new(targets: ScoringTargets) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &ScoringTargets {
        &self.targets
    }

    /// Non-finite metrics score zero.
    pub fn score(&self, metrics: &PerformanceMetrics) -> f64 {
        let t = &self.targets;

        let inputs = [
            metrics.total_return,
            metrics.sharpe_ratio,
            metrics.max_drawdown,
            metrics.win_rate,
            metrics.consistency_score,
        ];
        if inputs.iter().any(|v| !v.is_finite()) {
            return 0.0;
        }

        let return_score = (metrics.total_return / t.monthly_return).min(COMPONENT_CAP);
        let sharpe_score = (metrics.sharpe_ratio / t.sharpe_ratio).min(COMPONENT_CAP);
        let drawdown_score = ((t.max_drawdown - metrics.max_drawdown) / t.max_drawdown).max(0.0);
        let win_rate_score = metrics.win_rate / t.win_rate;

        let score = return_score * RETURN_WEIGHT
            + sharpe_score * SHARPE_WEIGHT
            + drawdown_score * DRAWDOWN_WEIGHT
            + win_rate_score * WIN_RATE_WEIGHT
            + metrics.consistency_score * CONSISTENCY_WEIGHT;

        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, MAX_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(total_return: f64, sharpe: f64, dd: f64, win_rate: f64, consistency: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            total_return,
            sharpe_ratio: sharpe,
            max_drawdown: dd,
            win_rate,
            consistency_score: consistency,
            ..Default::default()
        }
    }

    #[test]
    fn test_on_target_scores_one() {
        let scorer = PerformanceScorer::default();
        // every ratio 1.0, zero drawdown, full consistency
        let score = scorer.score(&metrics(0.25, 2.0, 0.0, 0.75, 1.0));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_beyond_tolerance_scores_zero() {
        let scorer = PerformanceScorer::default();
        let within = scorer.score(&metrics(0.0, 0.0, 0.05, 0.0, 0.0));
        let beyond = scorer.score(&metrics(0.0, 0.0, 0.5, 0.0, 0.0));
        assert!((within - 0.1).abs() < 1e-12);
        assert_eq!(beyond, 0.0);
    }

    #[test]
    fn test_capped_at_two() {
        let scorer = PerformanceScorer::default();
        // capped components give at most 1.6; consistency pushes past 2.0
        assert!((scorer.score(&metrics(10.0, 50.0, 0.0, 1.0, 1.0)) - 1.6).abs() < 1e-12);
        let score = scorer.score(&metrics(10.0, 50.0, 0.0, 1.0, 20.0));
        assert_eq!(score, MAX_SCORE);
    }

    #[test]
    fn test_every_target_moves_the_score() {
        let m = metrics(0.1, 1.0, 0.05, 0.5, 0.5);
        let base = PerformanceScorer::default().score(&m);

        let tweaks: [fn(&mut ScoringTargets); 4] = [
            |t| t.monthly_return = 0.5,
            |t| t.sharpe_ratio = 4.0,
            |t| t.max_drawdown = 0.2,
            |t| t.win_rate = 0.9,
        ];
        for tweak in tweaks {
            let mut targets = ScoringTargets::default();
            tweak(&mut targets);
            let score = PerformanceScorer::new(targets).score(&m);
            assert!((score - base).abs() > 1e-6);
        }
    }

    #[test]
    fn test_losses_floor_at_zero() {
        let scorer = PerformanceScorer::default();
        let score = scorer.score(&metrics(-3.0, -4.0, 0.6, 0.1, 0.1));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_nan_metrics_score_zero() {
        let scorer = PerformanceScorer::default();
        assert_eq!(scorer.score(&metrics(f64::NAN, 1.0, 0.0, 0.5, 0.5)), 0.0);
        assert_eq!(scorer.score(&metrics(0.25, f64::NAN, 0.0, 0.75, 1.0)), 0.0);
        assert_eq!(scorer.score(&metrics(0.25, f64::INFINITY, 0.0, 0.75, 1.0)), 0.0);
        assert_eq!(scorer.score(&metrics(0.25, 2.0, f64::NAN, 0.75, 1.0)), 0.0);
    }
}
