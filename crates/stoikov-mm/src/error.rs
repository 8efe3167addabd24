//! Error types for stoikov-mm.

use thiserror::Error;

/// Strategy error types.
#[derive(Debug, Error)]
pub enum MmError {
    /// A model parameter violated its domain (all must be strictly positive).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A batch call was handed inconsistent inputs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, MmError>;
