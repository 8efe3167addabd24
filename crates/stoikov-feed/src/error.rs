//! Error types for stoikov-feed.

use thiserror::Error;

/// Feed error types.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Frame could not be parsed as a book-ticker record.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Record parsed but carried an invalid book (non-positive or crossed).
    #[error("Invalid tick: {0}")]
    InvalidTick(String),

    /// Transport could not be opened.
    #[error("Connect error: {0}")]
    Connect(String),
}

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;
