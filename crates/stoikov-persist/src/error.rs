//! Error types for stoikov-persist.

use thiserror::Error;

/// Persistence error types. Never fatal to the pipeline.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink failure: {0}")]
    Sink(String),
}

/// Result type alias for persistence operations.
pub type PersistResult<T> = std::result::Result<T, PersistError>;
