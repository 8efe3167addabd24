//! Telemetry persistence for the stoikov engine.
//!
//! Rows for four logical tables (`market_ticks`, `quotes`, `trading_stats`,
//! `simulation_sessions`) are enqueued by the pipeline into a bounded
//! drop-oldest queue and written by a background task through a batching
//! JSON Lines sink. Persistence is strictly best-effort: failures are logged
//! and counted, and the hot path never blocks on a write.

pub mod error;
pub mod queue;
pub mod record;
pub mod sink;

pub use error::{PersistError, PersistResult};
pub use queue::{spawn_sink, SinkStats, TelemetryHandle};
pub use record::{
    MarketTickRow, QuoteRow, SessionRow, SessionStatus, TelemetryRecord, TradingStatsRow,
};
pub use sink::{JsonLinesSink, TelemetrySink};
