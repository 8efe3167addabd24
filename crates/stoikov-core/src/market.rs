//! Market data value records.
//!
//! `Tick`, `Quote` and `Fill` are plain value types at the boundary between
//! components. They flow by copy/clone through the pipeline; nothing in here
//! holds state.

use crate::{Instrument, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in a (365-day) year, the annualisation base shared by the
/// volatility estimator and the backtest price generator.
pub const SECONDS_PER_YEAR: f64 = 31_536_000.0;

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns +1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Top-of-book market update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp when this tick was received.
    pub timestamp: DateTime<Utc>,
    /// Instrument the tick belongs to.
    pub instrument: Instrument,
    /// Best bid price.
    pub bid: Price,
    /// Best ask price.
    pub ask: Price,
    /// Best bid size.
    pub bid_qty: Size,
    /// Best ask size.
    pub ask_qty: Size,
    /// Volatility hint. Zero (or anything non-positive) means "absent":
    /// the quoter falls back to its configured sigma.
    pub volatility: f64,
}

impl Tick {
    pub fn new(
        instrument: Instrument,
        bid: Price,
        ask: Price,
        bid_qty: Size,
        ask_qty: Size,
        volatility: f64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            instrument,
            bid,
            ask,
            bid_qty,
            ask_qty,
            volatility,
        }
    }

    /// Mid price: (bid + ask) / 2.
    #[inline]
    pub fn mid_price(&self) -> Price {
        Price::new((self.bid.inner() + self.ask.inner()) / Decimal::TWO)
    }

    /// Spread: ask - bid.
    #[inline]
    pub fn spread(&self) -> Price {
        self.ask - self.bid
    }

    /// Spread in basis points relative to mid.
    pub fn spread_bps(&self) -> Option<Decimal> {
        let mid = self.mid_price();
        if mid.is_zero() {
            return None;
        }
        Some(self.spread().inner() / mid.inner() * Decimal::from(10000))
    }

    /// Both prices positive and the book uncrossed.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bid.is_positive() && self.ask.is_positive() && self.ask >= self.bid
    }
}

/// Two-sided quote produced by the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Timestamp when this quote was computed.
    pub timestamp: DateTime<Utc>,
    /// Instrument quoted.
    pub instrument: Instrument,
    /// Our bid price.
    pub bid: Price,
    /// Our ask price.
    pub ask: Price,
    /// Bid size.
    pub bid_size: Size,
    /// Ask size.
    pub ask_size: Size,
    /// Internal order id for the quote pair.
    pub order_id: u64,
}

impl Quote {
    pub fn new(
        instrument: Instrument,
        bid: Price,
        ask: Price,
        bid_size: Size,
        ask_size: Size,
        order_id: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            instrument,
            bid,
            ask,
            bid_size,
            ask_size,
            order_id,
        }
    }

    /// Mid price of our own quote.
    #[inline]
    pub fn mid_price(&self) -> Price {
        Price::new((self.bid.inner() + self.ask.inner()) / Decimal::TWO)
    }

    /// Quoted spread: ask - bid.
    #[inline]
    pub fn spread(&self) -> Price {
        self.ask - self.bid
    }

    /// Quoted spread in basis points relative to our mid.
    pub fn spread_bps(&self) -> Option<Decimal> {
        let mid = self.mid_price();
        if mid.is_zero() {
            return None;
        }
        Some(self.spread().inner() / mid.inner() * Decimal::from(10000))
    }

    /// Positive prices and sizes on both sides.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bid.is_positive()
            && self.ask.is_positive()
            && self.bid_size.is_positive()
            && self.ask_size.is_positive()
    }

    /// Whether our price on `side` is within `eps` relative distance of the
    /// market's best price on that side.
    pub fn is_competitive(&self, side: Side, market_price: Price, eps: Decimal) -> bool {
        if market_price.is_zero() {
            return false;
        }
        let ours = match side {
            Side::Buy => self.bid.inner(),
            Side::Sell => self.ask.inner(),
        };
        ((ours - market_price.inner()) / market_price.inner()).abs() < eps
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quote{{{} bid={} ask={} spread={}}}",
            self.instrument,
            self.bid,
            self.ask,
            self.spread()
        )
    }
}

/// A simulated execution against one side of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Timestamp of the fill.
    pub timestamp: DateTime<Utc>,
    /// Instrument filled.
    pub instrument: Instrument,
    /// Side of OUR order (buy = our bid was lifted).
    pub side: Side,
    /// Execution price.
    pub price: Price,
    /// Executed size.
    pub size: Size,
    /// Order id of the quote that filled.
    pub order_id: u64,
    /// Signed fee on the fill notional. Negative denotes a maker rebate.
    pub fee: Decimal,
}

impl Fill {
    pub fn new(
        instrument: Instrument,
        side: Side,
        price: Price,
        size: Size,
        order_id: u64,
        fee: Decimal,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            instrument,
            side,
            price,
            size,
            order_id,
            fee,
        }
    }

    /// Fill notional: price * size.
    #[inline]
    pub fn notional(&self) -> Decimal {
        self.size.notional(self.price)
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }
}
