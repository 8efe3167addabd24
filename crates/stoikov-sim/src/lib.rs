//! Market simulation for the stoikov engine.
//!
//! A seeded geometric Brownian price generator that doubles as a
//! `TickSource` for the pipeline, an aggressiveness-based fill model, and a
//! standalone backtest driver producing run statistics.

pub mod simulator;

pub use simulator::{BacktestStats, MarketSimulator, SimConfig};
