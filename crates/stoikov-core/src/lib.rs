//! Core domain types for the stoikov market-making engine.
//!
//! This crate provides the types shared by every other crate in the
//! workspace:
//! - `Instrument`: the closed registry of traded instruments
//! - `Price`, `Size`: precision-safe numeric newtypes
//! - `Tick`, `Quote`, `Fill`: value records flowing through the pipeline
//! - `TickSource`: the capability the pipeline consumes ticks from

pub mod decimal;
pub mod error;
pub mod instrument;
pub mod market;
pub mod source;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use instrument::Instrument;
pub use market::{Fill, Quote, Side, Tick, SECONDS_PER_YEAR};
pub use source::TickSource;
