//! Background optimization: periodic cycles off the decision path.
//!
//! Cycles run on the blocking pool under a wall-clock budget and publish the
//! resulting parameter set through an atomic swap. Sizing and stop-loss
//! calls only ever load the published set, so a running cycle never delays
//! them. A cycle still running when the next tick arrives is not queued
//! behind; that tick is skipped.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::models::{MarketSnapshot, StrategyParameterSet, TradeOutcome};
use crate::regime::RegimeDetector;

use super::{CycleReport, CycleStatus, OptimizerConfig, ParameterOptimizer};

/// Extra time the async side waits past the cycle budget before giving up.
const BUDGET_GRACE: Duration = Duration::from_millis(250);

/// Source of the histories a cycle runs on: the trade-history store and the
/// market-data provider.
pub trait CycleInputs: Send + Sync + 'static {
    fn trade_history(&self) -> Vec<TradeOutcome>;
    fn market_history(&self) -> Vec<MarketSnapshot>;
}

struct SearchState {
    optimizer: ParameterOptimizer,
    rng: StdRng,
}

/// Runs optimization cycles and publishes the results.
pub struct OptimizerService<I: CycleInputs> {
    inputs: Arc<I>,
    state: Arc<Mutex<SearchState>>,
    detector: RegimeDetector,
    published: Arc<ArcSwap<StrategyParameterSet>>,
    budget: Duration,
    interval: Duration,
}

impl<I: CycleInputs> OptimizerService<I> {
    /// Create a service publishing into `published`.
    pub fn new(
        config: OptimizerConfig,
        inputs: Arc<I>,
        published: Arc<ArcSwap<StrategyParameterSet>>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let budget = config.cycle_budget();
        let interval = config.interval();

        Self {
            inputs,
            state: Arc::new(Mutex::new(SearchState {
                optimizer: ParameterOptimizer::new(config),
                rng,
            })),
            detector: RegimeDetector::new(),
            published,
            budget,
            interval,
        }
    }

    /// Handle readers load the current parameter set from.
    pub fn published(&self) -> Arc<ArcSwap<StrategyParameterSet>> {
        Arc::clone(&self.published)
    }

    /// Run one cycle now. Returns `None` when the cycle was skipped, timed out
    /// or failed; the published set is left alone in those cases.
    pub async fn run_once(&self) -> Option<CycleReport> {
        let trades = self.inputs.trade_history();
        let market = self.inputs.market_history();
        let regime = self.detector.detect(&market).into_value();

        let state = Arc::clone(&self.state);
        let deadline = Instant::now() + self.budget;

        let task = tokio::task::spawn_blocking(move || {
            let mut guard = match state.try_lock() {
                Ok(guard) => guard,
                // a cycle from an earlier tick is still going
                Err(TryLockError::WouldBlock) => return None,
                Err(TryLockError::Poisoned(poisoned)) => {
                    error!("Optimizer state poisoned by a failed cycle, recovering");
                    state.clear_poison();
                    poisoned.into_inner()
                }
            };
            let SearchState { optimizer, rng } = &mut *guard;
            Some(optimizer.run_cycle(&trades, regime, rng, deadline))
        });

        let report = match timeout(self.budget + BUDGET_GRACE, task).await {
            Ok(Ok(Some(report))) => report,
            Ok(Ok(None)) => {
                debug!("Previous optimization cycle still running, skipping");
                return None;
            }
            Ok(Err(e)) => {
                error!(error = %e, "Optimization task failed");
                return None;
            }
            Err(_) => {
                warn!(budget_ms = self.budget.as_millis() as u64, "Optimization cycle timed out");
                return None;
            }
        };

        match report.status {
            CycleStatus::Optimized | CycleStatus::InsufficientData => {
                self.published.store(Arc::new(report.params.clone()));
            }
            CycleStatus::BudgetExceeded => {}
        }

        Some(report)
    }

    /// Run cycles on a fixed interval until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), "Optimizer service started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(report) = self.run_once().await {
                        debug!(
                            cycle = report.cycle,
                            status = ?report.status,
                            regime = %report.regime,
                            "Optimization cycle finished"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Optimizer service stopped");
    }

    /// Spawn the service onto the runtime.
    pub fn spawn(self) -> OptimizerHandle {
        let (tx, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        OptimizerHandle { shutdown: tx, join }
    }
}

/// Handle to a spawned [`OptimizerService`].
pub struct OptimizerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl OptimizerHandle {
    /// Signal the service to stop and wait for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "Optimizer service task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    struct StaticInputs {
        trades: Vec<TradeOutcome>,
        market: Vec<MarketSnapshot>,
    }

    impl CycleInputs for StaticInputs {
        fn trade_history(&self) -> Vec<TradeOutcome> {
            self.trades.clone()
        }

        fn market_history(&self) -> Vec<MarketSnapshot> {
            self.market.clone()
        }
    }

    fn inputs(trades: usize) -> Arc<StaticInputs> {
        Arc::new(StaticInputs {
            trades: (0..trades)
                .map(|i| {
                    let profit = if i % 4 == 0 { -15 } else { 30 };
                    TradeOutcome::new(Decimal::from(profit), profit as f64 / 10.0, 20.0)
                })
                .collect(),
            market: (0..30)
                .map(|i| MarketSnapshot::new(100.0 + i as f64 * 0.1, 1000.0, Utc::now()))
                .collect(),
        })
    }

    fn config() -> OptimizerConfig {
        OptimizerConfig {
            seed: Some(17),
            interval_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_once_publishes() {
        let published = Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default()));
        let service = OptimizerService::new(config(), inputs(30), Arc::clone(&published));

        let report = service.run_once().await.expect("cycle should run");
        assert_eq!(report.status, CycleStatus::Optimized);
        assert_eq!(**published.load(), report.params);
        assert!(published.load().is_within_bounds());
    }

    #[tokio::test]
    async fn test_short_history_publishes_defaults() {
        let published = Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default()));
        let service = OptimizerService::new(config(), inputs(3), Arc::clone(&published));

        let report = service.run_once().await.expect("cycle should run");
        assert_eq!(report.status, CycleStatus::InsufficientData);
        assert_eq!(**published.load(), StrategyParameterSet::default());
    }

    #[tokio::test]
    async fn test_recovers_after_failed_cycle() {
        let published = Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default()));
        let service = OptimizerService::new(config(), inputs(30), Arc::clone(&published));

        let state = Arc::clone(&service.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.lock();
            panic!("cycle failed");
        })
        .join();
        assert!(service.state.is_poisoned());

        let report = service.run_once().await.expect("cycle should run");
        assert_eq!(report.status, CycleStatus::Optimized);
        assert!(!service.state.is_poisoned());
    }

    #[tokio::test]
    async fn test_busy_state_skips_cycle() {
        let published = Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default()));
        let service = OptimizerService::new(config(), inputs(30), Arc::clone(&published));

        let state = Arc::clone(&service.state);
        let _busy = state.lock().expect("lock");
        assert!(service.run_once().await.is_none());
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let published = Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default()));
        let service = OptimizerService::new(config(), inputs(30), Arc::clone(&published));

        let handle = service.spawn();
        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio_test::assert_ok!(
            timeout(Duration::from_secs(5), handle.shutdown()).await,
            "service should stop promptly"
        );
        assert!(published.load().is_within_bounds());
    }
}
