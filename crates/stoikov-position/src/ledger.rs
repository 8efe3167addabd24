//! Per-instrument position ledger.

use rust_decimal::Decimal;
use std::fmt;
use stoikov_core::{Fill, Instrument, Price};

/// Running position state for a single instrument.
///
/// Quantity is signed (positive = long). The average entry price is
/// maintained volume-weighted while adding; reducing realizes P&L against it
/// and a flip re-bases it at the flipping fill's price. When the position is
/// exactly flattened the average is retained as the last-flatten price - it
/// has no economic meaning while flat.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    pub instrument: Instrument,
    /// Signed quantity. Positive = long, negative = short.
    pub quantity: Decimal,
    /// Volume-weighted average entry price of the open position.
    pub avg_price: Price,
    /// Cumulative realized P&L, excluding fees.
    pub realized_pnl: Decimal,
    /// Mark-to-market P&L of the open position.
    pub unrealized_pnl: Decimal,
}

impl PositionLedger {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            quantity: Decimal::ZERO,
            avg_price: Price::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Realized plus unrealized P&L.
    #[inline]
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }

    /// Absolute notional at the average entry price.
    pub fn exposure(&self) -> Decimal {
        (self.quantity * self.avg_price.inner()).abs()
    }

    /// Apply a fill to the position.
    ///
    /// Three cases: opening from flat, adding on the same side (weighted
    /// average), and reducing/flipping on the opposite side (realize the
    /// closed portion, re-base the average only on a flip).
    pub fn apply(&mut self, fill: &Fill) {
        let old_quantity = self.quantity;
        let old_avg = self.avg_price.inner();
        let fill_price = fill.price.inner();
        let fill_size = fill.size.inner();

        let signed = match fill.side.sign() {
            1 => fill_size,
            _ => -fill_size,
        };
        self.quantity = old_quantity + signed;

        if old_quantity.is_zero() {
            // Opening a new position
            self.avg_price = fill.price;
        } else if old_quantity.is_sign_positive() == signed.is_sign_positive() {
            // Adding to the existing position: weighted average entry
            self.avg_price = Price::new(
                (old_quantity.abs() * old_avg + fill_size * fill_price) / self.quantity.abs(),
            );
        } else {
            // Reducing or flipping
            let closed = old_quantity.abs().min(fill_size);

            if old_quantity > Decimal::ZERO {
                // Closing long with a sell
                self.realized_pnl += closed * (fill_price - old_avg);
            } else {
                // Closing short with a buy
                self.realized_pnl += closed * (old_avg - fill_price);
            }

            if fill_size > old_quantity.abs() {
                // Flipped: the remainder opens at the fill price
                self.avg_price = fill.price;
            }
            // Otherwise (partial close or exact flatten) the average stays.
        }
    }

    /// Mark the open position against `price`.
    pub fn mark(&mut self, price: Price) {
        self.unrealized_pnl = if self.quantity > Decimal::ZERO {
            self.quantity * (price.inner() - self.avg_price.inner())
        } else if self.quantity < Decimal::ZERO {
            self.quantity.abs() * (self.avg_price.inner() - price.inner())
        } else {
            Decimal::ZERO
        };
    }
}

impl fmt::Display for PositionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_long() {
            "LONG"
        } else if self.is_short() {
            "SHORT"
        } else {
            "FLAT"
        };
        write!(
            f,
            "Position{{{} {} qty={} avg=${} realized=${} unrealized=${}}}",
            self.instrument,
            direction,
            self.quantity,
            self.avg_price,
            self.realized_pnl,
            self.unrealized_pnl
        )
    }
}
