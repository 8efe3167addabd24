//! Observability for the stoikov engine.
//!
//! - Structured logging via `tracing` (JSON in production, pretty in dev)
//! - Latency instrumentation: named-operation nanosecond stats with scoped
//!   timers and bounded sample rings

pub mod error;
pub mod latency;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use latency::{LatencyRegistry, LatencySnapshot, ScopedTimer};
pub use logging::init_logging;
