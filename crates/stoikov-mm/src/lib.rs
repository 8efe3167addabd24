//! Quoting strategy for the stoikov engine.
//!
//! Two pieces:
//! - `EwmaVolatility`: online exponentially-weighted estimate of short-horizon
//!   volatility from squared log-returns, annualised and floored
//! - `Quoter`: the Avellaneda-Stoikov optimal quoting model as a pure
//!   function of (mid, volatility, inventory, parameters)
//!
//! The math runs in `f64`; conversion to `Price` happens only when a `Quote`
//! is materialised.

pub mod error;
pub mod quoter;
pub mod volatility;

pub use error::{MmError, Result};
pub use quoter::{Quoter, QuoterParams};
pub use volatility::EwmaVolatility;
