//! Row types for the outbound tables.
//!
//! One serde struct per logical table. Prices and P&L figures are serialized
//! as decimals; symbols as canonical instrument names.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `market_ticks` table: raw top-of-book snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTickRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub bid: Decimal,
    pub bid_size: Decimal,
    pub ask: Decimal,
    pub ask_size: Decimal,
    pub spread: Decimal,
    pub mid_price: Decimal,
    pub simulation_id: String,
}

/// `quotes` table: our quotes with strategy context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub our_bid: Decimal,
    pub our_ask: Decimal,
    pub our_spread: Decimal,
    pub spread_bps: Decimal,
    pub market_mid: Decimal,
    pub position: Decimal,
    pub avg_entry_price: Decimal,
    pub volatility: f64,
    pub simulation_id: String,
}

/// `trading_stats` table: rolling session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingStatsRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub position: Decimal,
    pub avg_entry_price: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub fill_count: u64,
    pub quote_count: u64,
    pub fill_rate: f64,
    pub simulation_id: String,
}

/// Terminal (or initial) state of a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Halted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Halted => write!(f, "halted"),
        }
    }
}

/// `simulation_sessions` table. The store is append-only, so a session is
/// first written with status `running` and superseded by a terminal row with
/// the same `simulation_id`; readers keep the last row per id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub simulation_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub symbol: String,
    pub algorithm_params: String,
    pub final_stats: Option<String>,
    pub status: SessionStatus,
}

/// A record destined for one of the outbound tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum TelemetryRecord {
    MarketTick(MarketTickRow),
    Quote(QuoteRow),
    TradingStats(TradingStatsRow),
    Session(SessionRow),
}

impl TelemetryRecord {
    /// File stem of the table this record belongs to.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::MarketTick(_) => "market_ticks",
            Self::Quote(_) => "quotes",
            Self::TradingStats(_) => "trading_stats",
            Self::Session(_) => "simulation_sessions",
        }
    }
}
