//! riskcore CLI
//!
//! Runs the risk components one at a time over command-line or JSON file
//! inputs and prints the result as JSON.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use riskcore::models::{MarketRegime, MarketSnapshot, TradeDirection, TradeOutcome, TradeStatistics};
use riskcore::optimizer::{predict_performance, OptimizerConfig, ParameterOptimizer};
use riskcore::regime::RegimeDetector;
use riskcore::trading::{PositionSizer, RiskConfig, StopLossCalculator};
use riskcore::RiskEngine;

/// Risk-adjusted decision engine CLI.
#[derive(Parser)]
#[command(name = "riskcore")]
#[command(about = "Position sizing, stops, market risk and parameter tuning", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Fraction of the portfolio risked per trade
    #[arg(long, env = "RISKCORE_MAX_PORTFOLIO_RISK", default_value = "0.02", global = true)]
    max_portfolio_risk: f64,

    /// Concurrent-trade cap before risk scaling
    #[arg(long, env = "RISKCORE_MAX_CONCURRENT_TRADES", default_value = "15", global = true)]
    max_concurrent_trades: u32,

    /// Seed for the parameter search
    #[arg(long, env = "RISKCORE_SEED", global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Kelly position size for a balance and trade statistics
    Size {
        /// Account balance
        #[arg(short, long)]
        balance: f64,

        /// Probability of a winning trade (0-1)
        #[arg(short = 'p', long)]
        win_probability: f64,

        /// Average win as a fraction
        #[arg(long)]
        avg_win: f64,

        /// Average loss as a fraction (positive)
        #[arg(long)]
        avg_loss: f64,
    },

    /// Dynamic stop-loss distance for an asset
    StopLoss {
        /// Asset symbol (BTC, EUR/USD, AAPL, GOLD...)
        asset: String,

        /// Recent volatility
        #[arg(short, long)]
        volatility: f64,

        /// Chart timeframe (1m, 5m, 15m, 1h, 4h, 1d)
        #[arg(short, long, default_value = "1h")]
        timeframe: String,

        /// Entry price; also prints the absolute stop price
        #[arg(short, long)]
        entry: Option<f64>,

        /// BUY or SELL
        #[arg(short, long, default_value = "BUY")]
        direction: String,
    },

    /// Trailing-stop price for an open position
    Trail {
        #[arg(short, long)]
        entry: f64,

        #[arg(short, long)]
        current: f64,

        /// BUY or SELL
        #[arg(short, long, default_value = "BUY")]
        direction: String,

        /// Trail distance as a fraction of price
        #[arg(long, default_value = "0.01")]
        distance: f64,
    },

    /// Market-wide risk report
    Assess {
        /// Average volatility across markets
        #[arg(short, long)]
        volatility: f64,

        /// Number of active markets
        #[arg(short, long)]
        markets: u32,
    },

    /// Classify the market regime from a JSON array of snapshots
    Regime {
        /// Path to the market history file
        file: PathBuf,
    },

    /// Run one optimization cycle over a JSON array of closed trades
    Optimize {
        /// Path to the trade history file
        trades: PathBuf,

        /// Market history used to detect the regime; neutral when omitted
        #[arg(short, long)]
        market: Option<PathBuf>,

        /// Wall-clock budget in milliseconds
        #[arg(long, default_value = "2000")]
        budget_ms: u64,
    },

    /// Show active protections and settings
    Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let risk_config = RiskConfig {
        max_portfolio_risk: cli.max_portfolio_risk,
        max_concurrent_trades: cli.max_concurrent_trades,
        ..Default::default()
    };

    match cli.command {
        Commands::Size {
            balance,
            win_probability,
            avg_win,
            avg_loss,
        } => {
            let stats = TradeStatistics::new(
                win_probability,
                avg_win,
                avg_loss,
                Decimal::try_from(balance)?,
            );
            let sizing = PositionSizer::new().sizing(&stats, risk_config.max_portfolio_risk);
            print_json(&sizing)?;
        }

        Commands::StopLoss {
            asset,
            volatility,
            timeframe,
            entry,
            direction,
        } => {
            let fraction = StopLossCalculator::new().stop_loss_fraction(&asset, volatility, &timeframe);
            let direction = TradeDirection::parse(&direction);
            let price = entry.map(|e| StopLossCalculator::stop_loss_price(e, fraction, direction));
            print_json(&json!({
                "asset": asset,
                "asset_class": riskcore::classify(&asset),
                "timeframe": timeframe,
                "stop_loss_pct": fraction,
                "stop_loss_price": price,
            }))?;
        }

        Commands::Trail {
            entry,
            current,
            direction,
            distance,
        } => {
            let engine = RiskEngine::new(RiskConfig {
                trail_distance: distance,
                ..risk_config
            });
            let position = riskcore::Position::new(
                "",
                TradeDirection::parse(&direction),
                entry,
                Decimal::ZERO,
                0.0,
            );
            let stop = engine.trailing_stop(&position, current, None);
            print_json(&json!({ "trailing_stop_price": stop }))?;
        }

        Commands::Assess { volatility, markets } => {
            let engine = RiskEngine::new(risk_config);
            print_json(&engine.assess_market(volatility, markets))?;
        }

        Commands::Regime { file } => {
            let history: Vec<MarketSnapshot> = read_json(&file)?;
            let detector = RegimeDetector::new();
            let features = detector.features(&history).ok();
            print_json(&json!({
                "regime": detector.detect(&history),
                "features": features,
            }))?;
        }

        Commands::Optimize {
            trades,
            market,
            budget_ms,
        } => {
            let history: Vec<TradeOutcome> = read_json(&trades)?;
            let regime = match market {
                Some(path) => {
                    let snapshots: Vec<MarketSnapshot> = read_json(&path)?;
                    RegimeDetector::new().detect(&snapshots).into_value()
                }
                None => MarketRegime::Neutral,
            };

            let config = OptimizerConfig {
                cycle_budget_ms: budget_ms,
                seed: cli.seed,
                ..Default::default()
            };
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let deadline = Instant::now() + Duration::from_millis(budget_ms);

            info!(trades = history.len(), regime = %regime, "Running optimization cycle");

            let mut optimizer = ParameterOptimizer::new(config);
            let report = optimizer.run_cycle(&history, regime, &mut rng, deadline);
            let prediction = predict_performance(&report.params, regime);

            print_json(&json!({
                "report": report,
                "prediction": prediction,
            }))?;
        }

        Commands::Profile => {
            let engine = RiskEngine::new(risk_config);
            print_json(&engine.profile())?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
