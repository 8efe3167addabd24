//! Avellaneda-Stoikov market-making engine - entry point.
//!
//! Connects a tick source (live book-ticker stream or seeded backtest
//! generator) to the quoting pipeline and runs for the requested duration.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use stoikov_core::Instrument;
use stoikov_engine::config::FeedMode;
use stoikov_engine::{EngineConfig, EngineError, Pipeline, Session, SessionOutcome};
use stoikov_feed::BookTickerFeed;
use stoikov_persist::{spawn_sink, JsonLinesSink};
use stoikov_sim::{MarketSimulator, SimConfig};
use stoikov_telemetry::LatencyRegistry;
use tracing::{info, warn};

/// Fallback when the duration argument is missing or unusable.
const DEFAULT_DURATION_SECS: u64 = 120;

/// Avellaneda-Stoikov market-making engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Simulation duration in seconds (default 120)
    duration: Option<String>,

    /// Configuration file path (also via STOIKOV_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

/// Parse the positional duration, warning and falling back on anything that
/// is not a positive integer.
fn resolve_duration(arg: Option<&str>) -> u64 {
    match arg {
        None => DEFAULT_DURATION_SECS,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(secs) if secs > 0 => secs as u64,
            Ok(_) => {
                warn!(raw, "duration must be positive, using default {DEFAULT_DURATION_SECS}s");
                DEFAULT_DURATION_SECS
            }
            Err(_) => {
                warn!(raw, "invalid duration argument, using default {DEFAULT_DURATION_SECS}s");
                DEFAULT_DURATION_SECS
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    stoikov_telemetry::init_logging()?;

    info!("Starting stoikov engine v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(args.config.as_deref())?;
    let duration = resolve_duration(args.duration.as_deref());

    let instrument = Instrument::parse(&config.feed.symbol).ok_or_else(|| {
        EngineError::Config(format!("unsupported symbol: {}", config.feed.symbol))
    })?;

    let session = Session::start(instrument, duration);
    info!(
        simulation_id = %session.simulation_id,
        %instrument,
        duration_s = duration,
        mode = ?config.feed.mode,
        "session configured"
    );

    let sink = JsonLinesSink::new(&config.persistence.data_dir, config.persistence.batch_size);
    let (telemetry, sink_task) = spawn_sink(sink, config.persistence.queue_capacity);
    let latency = Arc::new(LatencyRegistry::new(config.telemetry.latency_enabled));

    let outcome = match config.feed.mode {
        FeedMode::Live => {
            // A transport that cannot open is the one fatal setup failure.
            let source = BookTickerFeed::connect(&config.feed.url)
                .await
                .map_err(EngineError::Transport)?;
            let pipeline =
                Pipeline::new(source, config.clone(), session, telemetry, latency.clone())?;
            pipeline.run().await?
        }
        FeedMode::Backtest => {
            let source = MarketSimulator::new(SimConfig {
                instrument,
                initial_price: config.backtest.initial_price,
                annual_volatility: config.backtest.annual_volatility,
                spread_bps: config.backtest.spread_bps,
                time_step_secs: config.backtest.time_step_secs,
                num_ticks: config.backtest.num_ticks,
                base_fill_probability: config.engine.base_fill_probability,
                aggressive_fill_bonus: config.backtest.aggressive_fill_bonus,
                fee_bps: 10.0,
                seed: config.backtest.seed,
            });
            let pipeline =
                Pipeline::new(source, config.clone(), session, telemetry, latency.clone())?;
            pipeline.run().await?
        }
    };

    // Let the sink drain before reporting.
    if let Err(e) = sink_task.await {
        warn!(?e, "sink task ended abnormally");
    }

    report(&outcome, &latency);

    // Kill-switch halts are a clean termination; only setup failures exit
    // non-zero, and those returned Err above.
    Ok(())
}

fn report(outcome: &SessionOutcome, latency: &LatencyRegistry) {
    info!(
        status = %outcome.status,
        ticks = outcome.counters.ticks,
        quotes = outcome.counters.quotes,
        fills = outcome.counters.fills(),
        fill_rate = outcome.counters.fill_rate(),
        gross_pnl = %outcome.gross_pnl,
        fees = %outcome.counters.fees,
        net_pnl = %outcome.net_pnl,
        "session complete"
    );

    if latency.is_enabled() {
        for line in latency.report().lines() {
            info!("{line}");
        }
    }
}
