//! Error types for stoikov-engine.

use thiserror::Error;

/// Engine error types. Only construction-time failures reach the process
/// boundary; everything on the tick path is handled in place.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] stoikov_feed::FeedError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] stoikov_mm::MmError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
