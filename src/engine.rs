//! Risk engine: the entry point the execution side talks to.
//!
//! Ties the sizing, stop-loss, correlation and market-risk components to a
//! shared correlation store and the currently published strategy parameters.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Estimate;
use crate::models::{
    MarketRegime, MarketSnapshot, OrderPlan, Position, RiskReport, StrategyParam,
    StrategyParameterSet, TradeDirection, TradeStatistics,
};
use crate::regime::RegimeDetector;
use crate::trading::{
    CorrelationGate, CorrelationStore, MarketRiskAssessor, PositionSizer, RiskConfig,
    StopLossCalculator, TrailingStopTracker, MAX_KELLY_FRACTION, MAX_STOP_LOSS_FRACTION,
    MIN_STOP_LOSS_FRACTION, REFERENCE_RISK_BUDGET,
};

/// A candidate entry to be risk-checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRequest {
    pub asset: String,
    pub direction: TradeDirection,

    /// Expected fill price
    pub entry_price: f64,

    /// Recent volatility of the asset
    pub volatility: f64,

    /// Chart timeframe label ("1m", "1h", ...)
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// Statistics the position is sized from
    pub stats: TradeStatistics,
}

fn default_timeframe() -> String {
    "1h".to_string()
}

/// Result of entry validation.
#[derive(Debug, Clone, Serialize)]
pub struct EntryValidation {
    pub allowed: bool,
    pub reason: String,
    pub plan: Option<OrderPlan>,

    /// Set when the size came from the safe default rather than Kelly
    pub sizing_fallback: Option<String>,
}

impl EntryValidation {
    pub fn allow(plan: OrderPlan, sizing_fallback: Option<String>) -> Self {
        Self {
            allowed: true,
            reason: "Entry conditions met".to_string(),
            plan: Some(plan),
            sizing_fallback,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            plan: None,
            sizing_fallback: None,
        }
    }
}

/// Snapshot of the engine's active protections and settings.
#[derive(Debug, Clone, Serialize)]
pub struct RiskProfile {
    pub generated_at: DateTime<Utc>,
    pub settings: RiskConfig,
    pub active_protections: Vec<&'static str>,

    /// Largest fraction of balance a single Kelly-sized trade can take
    pub max_single_trade_risk: f64,

    pub max_concurrent_trades: u32,
    pub correlation_table_version: u64,
    pub correlation_pairs: usize,
    pub parameters: StrategyParameterSet,
}

/// Facade over the risk components.
pub struct RiskEngine {
    config: RiskConfig,
    sizer: PositionSizer,
    stops: StopLossCalculator,
    trailing: TrailingStopTracker,
    gate: CorrelationGate,
    assessor: MarketRiskAssessor,
    detector: RegimeDetector,
    correlations: Arc<CorrelationStore>,
    params: Arc<ArcSwap<StrategyParameterSet>>,
}

impl RiskEngine {
    /// Engine with the seeded correlation table and default parameters.
    pub fn new(config: RiskConfig) -> Self {
        Self::with_shared(
            config,
            Arc::new(CorrelationStore::default()),
            Arc::new(ArcSwap::from_pointee(StrategyParameterSet::default())),
        )
    }

    /// Engine reading from an existing correlation store and parameter handle,
    /// typically the one an `OptimizerService` publishes into.
    pub fn with_shared(
        config: RiskConfig,
        correlations: Arc<CorrelationStore>,
        params: Arc<ArcSwap<StrategyParameterSet>>,
    ) -> Self {
        Self {
            gate: CorrelationGate::new(&config),
            assessor: MarketRiskAssessor::new(config.max_concurrent_trades),
            sizer: PositionSizer::new(),
            stops: StopLossCalculator::new(),
            trailing: TrailingStopTracker::new(),
            detector: RegimeDetector::new(),
            config,
            correlations,
            params,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn correlations(&self) -> &Arc<CorrelationStore> {
        &self.correlations
    }

    /// Handle the optimizer publishes parameter sets through.
    pub fn params_handle(&self) -> Arc<ArcSwap<StrategyParameterSet>> {
        Arc::clone(&self.params)
    }

    /// Currently published parameter set.
    pub fn params(&self) -> Arc<StrategyParameterSet> {
        self.params.load_full()
    }

    // ==================== Entry Validation ====================

    /// Run a candidate through the concurrency cap, the correlation gate,
    /// position sizing and stop placement.
    ///
    /// `report` is the latest market risk report; when present its
    /// concurrent-trade cap and position multiplier apply.
    pub fn plan_entry(
        &self,
        request: &EntryRequest,
        open_positions: &[Position],
        report: Option<&RiskReport>,
    ) -> EntryValidation {
        if !(request.entry_price.is_finite() && request.entry_price > 0.0) {
            return EntryValidation::deny(format!(
                "Invalid entry price: {}",
                request.entry_price
            ));
        }

        let max_trades = report
            .map(|r| r.max_concurrent_trades)
            .unwrap_or(self.config.max_concurrent_trades) as usize;
        if open_positions.len() >= max_trades {
            return EntryValidation::deny(format!(
                "Max concurrent trades reached: {} >= {}",
                open_positions.len(),
                max_trades
            ));
        }

        let table = self.correlations.snapshot();
        let decision = self.gate.evaluate(&table, &request.asset, open_positions);
        if !decision.admitted {
            return EntryValidation::deny(format!(
                "Too correlated with open positions: {} above {}",
                decision.high_correlation_count, self.config.high_correlation_threshold
            ));
        }

        let (base_size, sizing_fallback) = if self.config.kelly_position_sizing {
            let sized = self
                .sizer
                .size(&request.stats, self.config.max_portfolio_risk);
            let fallback = sized.reason().map(|r| r.to_string());
            (sized.into_value(), fallback)
        } else {
            (
                self.sizer
                    .fixed_fraction_size(request.stats.currency_balance, self.config.max_portfolio_risk),
                None,
            )
        };

        let multiplier = match report {
            Some(r) if self.config.volatility_adjustment => r.position_multiplier,
            _ => 1.0,
        };
        let size = base_size * Decimal::try_from(multiplier).unwrap_or(Decimal::ONE);
        if size <= Decimal::ZERO {
            return EntryValidation::deny("Position size is zero");
        }

        let stop_loss_pct = if self.config.dynamic_stop_loss {
            self.stops
                .stop_loss_fraction(&request.asset, request.volatility, &request.timeframe)
        } else {
            self.params()
                .get(StrategyParam::StopLossPct)
                .clamp(MIN_STOP_LOSS_FRACTION, MAX_STOP_LOSS_FRACTION)
        };

        let stop_loss_price =
            StopLossCalculator::stop_loss_price(request.entry_price, stop_loss_pct, request.direction);
        let trailing_stop_price = self.trailing.update(
            request.entry_price,
            request.entry_price,
            request.direction,
            self.config.trail_distance,
        );

        info!(
            asset = %request.asset,
            direction = request.direction.as_str(),
            size = %size,
            stop_loss_pct,
            fallback = sizing_fallback.is_some(),
            "Entry planned"
        );

        EntryValidation::allow(
            OrderPlan {
                asset: request.asset.clone(),
                direction: request.direction,
                size,
                stop_loss_pct,
                stop_loss_price,
                trailing_stop_price,
            },
            sizing_fallback,
        )
    }

    // ==================== Monitoring ====================

    /// Trailing stop for an open position at `current_price`, never looser
    /// than `previous` when one is given.
    pub fn trailing_stop(&self, position: &Position, current_price: f64, previous: Option<f64>) -> f64 {
        let candidate = self.trailing.update(
            position.entry_price,
            current_price,
            position.direction,
            self.config.trail_distance,
        );
        let stop = TrailingStopTracker::ratchet(previous, candidate, position.direction);
        debug!(asset = %position.asset, current_price, stop, "Trailing stop updated");
        stop
    }

    pub fn assess_market(&self, avg_volatility: f64, active_markets: u32) -> RiskReport {
        let report = self.assessor.assess(avg_volatility, active_markets);
        if report.tier.position_multiplier() < 1.0 {
            warn!(
                tier = ?report.tier,
                overall_risk = report.overall_risk,
                "Elevated market risk: {}",
                report.tier.description()
            );
        }
        report
    }

    pub fn detect_regime(&self, history: &[MarketSnapshot]) -> Estimate<MarketRegime> {
        self.detector.detect(history)
    }

    pub fn profile(&self) -> RiskProfile {
        let table = self.correlations.snapshot();
        RiskProfile {
            generated_at: Utc::now(),
            settings: self.config.clone(),
            active_protections: self.config.active_protections(),
            max_single_trade_risk: MAX_KELLY_FRACTION * self.config.max_portfolio_risk
                / REFERENCE_RISK_BUDGET,
            max_concurrent_trades: self.config.max_concurrent_trades,
            correlation_table_version: table.version(),
            correlation_pairs: table.len(),
            parameters: (*self.params()).clone(),
        }
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
