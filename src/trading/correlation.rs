//! Pairwise asset correlations and the diversification gate.
//!
//! The table is immutable once built. [`CorrelationStore`] publishes whole
//! tables through an atomic pointer swap, so a reader either sees the old
//! table or the new one, never a mix.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{classify, normalize_symbol, Position};

use super::RiskConfig;

/// Estimate for two assets of the same class with no measured correlation.
pub const SAME_CLASS_CORRELATION: f64 = 0.4;

/// Estimate for two assets of different classes with no measured correlation.
pub const CROSS_CLASS_CORRELATION: f64 = 0.1;

/// A measured correlation between two assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub asset_a: String,
    pub asset_b: String,
    pub value: f64,
}

impl CorrelationEntry {
    pub fn new(asset_a: impl Into<String>, asset_b: impl Into<String>, value: f64) -> Self {
        Self {
            asset_a: asset_a.into(),
            asset_b: asset_b.into(),
            value,
        }
    }
}

/// Order-independent key for a pair of normalized symbols.
fn pair_key(a: &str, b: &str) -> (String, String) {
    let a = normalize_symbol(a);
    let b = normalize_symbol(b);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// An immutable, symmetric correlation table.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    version: u64,
    entries: HashMap<(String, String), f64>,
}

impl CorrelationTable {
    /// Build a table. Values are clamped into [-1, 1]; NaN entries are
    /// dropped. Later duplicates of a pair win.
    pub fn from_entries(version: u64, entries: impl IntoIterator<Item = CorrelationEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| !e.value.is_nan())
            .map(|e| (pair_key(&e.asset_a, &e.asset_b), e.value.clamp(-1.0, 1.0)))
            .collect();
        Self { version, entries }
    }

    /// Seed correlations for well-known pairs.
    pub fn seed() -> Self {
        Self::from_entries(
            1,
            [
                CorrelationEntry::new("BTC", "ETH", 0.85),
                CorrelationEntry::new("EUR/USD", "GBP/USD", 0.72),
                CorrelationEntry::new("AAPL", "MSFT", 0.65),
                CorrelationEntry::new("GOLD", "SILVER", 0.78),
                CorrelationEntry::new("BTC", "GOLD", -0.15),
                CorrelationEntry::new("USD/JPY", "EUR/USD", -0.68),
            ],
        )
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Measured correlation, if this pair is in the table.
    pub fn lookup(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&pair_key(a, b)).copied()
    }

    /// Measured correlation, or a class-based estimate when the pair is unknown.
    pub fn get_correlation(&self, a: &str, b: &str) -> f64 {
        if let Some(value) = self.lookup(a, b) {
            return value;
        }
        if classify(a) == classify(b) {
            SAME_CLASS_CORRELATION
        } else {
            CROSS_CLASS_CORRELATION
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = CorrelationEntry> + '_ {
        self.entries
            .iter()
            .map(|((a, b), v)| CorrelationEntry::new(a.clone(), b.clone(), *v))
    }
}

/// Shared holder of the current correlation table.
pub struct CorrelationStore {
    current: ArcSwap<CorrelationTable>,
}

impl CorrelationStore {
    pub fn new(table: CorrelationTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Consistent handle on the current table. Stays valid and unchanged
    /// after later replacements.
    pub fn snapshot(&self) -> Arc<CorrelationTable> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    pub fn get_correlation(&self, a: &str, b: &str) -> f64 {
        self.current.load().get_correlation(a, b)
    }

    /// Publish a new table in one atomic swap.
    pub fn replace_table(&self, table: CorrelationTable) {
        let version = table.version();
        let pairs = table.len();
        let previous = self.current.swap(Arc::new(table));
        info!(
            from = previous.version(),
            to = version,
            pairs,
            "Correlation table replaced"
        );
    }

    /// Build the next version from fresh measurements and publish it.
    pub fn publish(&self, entries: impl IntoIterator<Item = CorrelationEntry>) -> u64 {
        let next = self.version() + 1;
        self.replace_table(CorrelationTable::from_entries(next, entries));
        next
    }
}

impl Default for CorrelationStore {
    fn default() -> Self {
        Self::new(CorrelationTable::seed())
    }
}

/// Outcome of the diversification check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    pub admitted: bool,

    /// Open positions correlated above the threshold with the candidate
    pub high_correlation_count: usize,

    pub open_positions: usize,
}

/// Rejects candidates too correlated with the open portfolio.
#[derive(Debug, Clone)]
pub struct CorrelationGate {
    enabled: bool,
    threshold: f64,
    max_correlated: usize,
    min_positions: usize,
}

impl CorrelationGate {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            enabled: config.correlation_check,
            threshold: config.high_correlation_threshold,
            max_correlated: config.max_correlated_positions,
            min_positions: config.min_positions_for_correlation_check,
        }
    }

    pub fn evaluate(
        &self,
        table: &CorrelationTable,
        candidate: &str,
        open_positions: &[Position],
    ) -> GateDecision {
        let open = open_positions.len();

        if !self.enabled || open < self.min_positions {
            return GateDecision {
                admitted: true,
                high_correlation_count: 0,
                open_positions: open,
            };
        }

        let high_correlation_count = open_positions
            .iter()
            .filter(|p| table.get_correlation(candidate, &p.asset) > self.threshold)
            .count();

        let admitted = high_correlation_count < self.max_correlated;
        if admitted {
            debug!(candidate, high_correlation_count, "Correlation check passed");
        } else {
            warn!(
                candidate,
                high_correlation_count,
                open,
                "Position rejected: highly correlated with open positions"
            );
        }

        GateDecision {
            admitted,
            high_correlation_count,
            open_positions: open,
        }
    }

    pub fn admit(&self, table: &CorrelationTable, candidate: &str, open_positions: &[Position]) -> bool {
        self.evaluate(table, candidate, open_positions).admitted
    }
}

impl Default for CorrelationGate {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}
