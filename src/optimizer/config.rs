//! Optimizer configuration and scoring targets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Performance targets each score component is normalized against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringTargets {
    /// Monthly return target (0.25 = 25%)
    pub monthly_return: f64,

    /// Tolerated drawdown (0.10 = 10%)
    pub max_drawdown: f64,

    /// Target win rate
    pub win_rate: f64,

    /// Target Sharpe-like ratio
    pub sharpe_ratio: f64,
}

impl Default for ScoringTargets {
    fn default() -> Self {
        Self {
            monthly_return: 0.25,
            max_drawdown: 0.10,
            win_rate: 0.75,
            sharpe_ratio: 2.0,
        }
    }
}

/// Configuration for the parameter search and its background schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Mutations tried per cycle
    pub iterations: usize,

    /// Closed trades required before searching
    pub min_history: usize,

    /// Mutation offset as a fraction of each parameter's range width
    pub mutation_scale: f64,

    /// Parameters mutated per iteration, inclusive bounds
    pub min_mutated_params: usize,
    pub max_mutated_params: usize,

    /// Weight of the search result when blending with the regime table
    pub search_weight: f64,

    /// Capital the trade profits are measured against
    pub base_capital: f64,

    /// Wall-clock budget for one cycle (milliseconds)
    pub cycle_budget_ms: u64,

    /// Time between background cycles (seconds)
    pub interval_secs: u64,

    /// Seed for the search; random when unset
    pub seed: Option<u64>,

    pub targets: ScoringTargets,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            min_history: 10,
            mutation_scale: 0.1,   // +/-10% of range
            min_mutated_params: 2,
            max_mutated_params: 3,
            search_weight: 0.7,    // 70/30 with the regime table
            base_capital: 1000.0,
            cycle_budget_ms: 2000,
            interval_secs: 300,
            seed: None,
            targets: ScoringTargets::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn cycle_budget(&self) -> Duration {
        Duration::from_millis(self.cycle_budget_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
