//! Market data ingestion for the stoikov engine.
//!
//! Parses exchange book-ticker frames into `Tick`s and exposes a live
//! WebSocket `TickSource`. The parser keeps two paths: a serde reference
//! path and a positional fast scanner that is only trusted after it has
//! agreed with the reference on a long consecutive streak of real frames.

pub mod error;
pub mod live;
pub mod parser;

pub use error::{FeedError, FeedResult};
pub use live::BookTickerFeed;
pub use parser::{ParserMode, TickParser};
