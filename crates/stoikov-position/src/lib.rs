//! Position accounting for the stoikov engine.
//!
//! `PositionLedger` is the per-instrument state machine (quantity, average
//! entry, realized/unrealized P&L); `PnlTracker` owns one ledger per
//! registered instrument in a dense array and aggregates across them.
//!
//! Fees are deliberately NOT folded into realized P&L here: the pipeline
//! surfaces them separately and deducts them when reporting net P&L.

pub mod ledger;
pub mod tracker;

pub use ledger::PositionLedger;
pub use tracker::PnlTracker;
