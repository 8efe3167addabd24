//! Multi-instrument P&L aggregation.

use crate::ledger::PositionLedger;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use stoikov_core::{Fill, Instrument, Price};

/// Aggregates one `PositionLedger` per registered instrument.
///
/// Ledgers live in a dense array indexed by `Instrument::index()`, allocated
/// once at construction; the hot path never touches the heap. Totals are
/// re-summed over the (small, fixed) array on every update rather than
/// maintained incrementally, which avoids floating drift from accumulated
/// deltas.
#[derive(Debug, Clone)]
pub struct PnlTracker {
    positions: [PositionLedger; Instrument::COUNT],
    total_realized: Decimal,
    total_unrealized: Decimal,
}

impl Default for PnlTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PnlTracker {
    pub fn new() -> Self {
        Self {
            positions: std::array::from_fn(|i| {
                PositionLedger::new(Instrument::from_index(i).expect("dense instrument index"))
            }),
            total_realized: Decimal::ZERO,
            total_unrealized: Decimal::ZERO,
        }
    }

    /// Apply a fill to the owning ledger and refresh the realized total.
    pub fn update_fill(&mut self, fill: &Fill) {
        self.positions[fill.instrument.index()].apply(fill);
        self.total_realized = self.positions.iter().map(|p| p.realized_pnl).sum();
    }

    /// Mark one instrument against `price` and refresh the unrealized total.
    pub fn update_mark(&mut self, instrument: Instrument, price: Price) {
        self.positions[instrument.index()].mark(price);
        self.total_unrealized = self.positions.iter().map(|p| p.unrealized_pnl).sum();
    }

    #[inline]
    pub fn realized(&self) -> Decimal {
        self.total_realized
    }

    #[inline]
    pub fn unrealized(&self) -> Decimal {
        self.total_unrealized
    }

    /// Total P&L across all instruments, excluding fees.
    #[inline]
    pub fn total(&self) -> Decimal {
        self.total_realized + self.total_unrealized
    }

    #[inline]
    pub fn position(&self, instrument: Instrument) -> &PositionLedger {
        &self.positions[instrument.index()]
    }

    /// Iterate all ledgers in index order.
    pub fn positions(&self) -> impl Iterator<Item = &PositionLedger> {
        self.positions.iter()
    }

    /// Human-readable summary listing every position that has traded.
    pub fn summary(&self) -> String {
        let mut out = String::from("=== P&L Summary ===\n");
        let _ = writeln!(out, "Realized P&L: ${}", self.total_realized);
        let _ = writeln!(out, "Unrealized P&L: ${}", self.total_unrealized);
        let _ = writeln!(out, "Total P&L: ${}", self.total());
        out.push_str("\nPositions:\n");
        for pos in &self.positions {
            if !pos.quantity.is_zero() || !pos.realized_pnl.is_zero() {
                let _ = writeln!(out, "  {pos}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stoikov_core::{Side, Size};

    fn fill(instrument: Instrument, side: Side, price: Decimal, size: Decimal) -> Fill {
        Fill::new(
            instrument,
            side,
            Price::new(price),
            Size::new(size),
            0,
            Decimal::ZERO,
        )
    }

    #[test]
    fn test_totals_aggregate_across_instruments() {
        let mut tracker = PnlTracker::new();

        tracker.update_fill(&fill(Instrument::Btc, Side::Buy, dec!(100), dec!(1)));
        tracker.update_fill(&fill(Instrument::Btc, Side::Sell, dec!(105), dec!(1)));

        tracker.update_fill(&fill(Instrument::Eth, Side::Sell, dec!(200), dec!(1)));
        tracker.update_fill(&fill(Instrument::Eth, Side::Buy, dec!(195), dec!(1)));

        assert_eq!(tracker.realized(), dec!(10));
        assert_eq!(tracker.total(), dec!(10));
    }

    #[test]
    fn test_mark_updates_unrealized_total() {
        let mut tracker = PnlTracker::new();
        tracker.update_fill(&fill(Instrument::Btc, Side::Buy, dec!(100), dec!(2)));
        tracker.update_fill(&fill(Instrument::Sol, Side::Sell, dec!(50), dec!(10)));

        tracker.update_mark(Instrument::Btc, Price::new(dec!(110)));
        assert_eq!(tracker.unrealized(), dec!(20));

        tracker.update_mark(Instrument::Sol, Price::new(dec!(48)));
        assert_eq!(tracker.unrealized(), dec!(40));
        assert_eq!(tracker.total(), dec!(40));
    }

    #[test]
    fn test_position_lookup() {
        let mut tracker = PnlTracker::new();
        tracker.update_fill(&fill(Instrument::Bnb, Side::Buy, dec!(300), dec!(1)));

        assert_eq!(tracker.position(Instrument::Bnb).quantity, dec!(1));
        assert!(tracker.position(Instrument::Btc).is_flat());
    }

    #[test]
    fn test_summary_lists_only_traded_positions() {
        let mut tracker = PnlTracker::new();
        tracker.update_fill(&fill(Instrument::Eth, Side::Buy, dec!(100), dec!(1)));

        let summary = tracker.summary();
        assert!(summary.contains("ETHUSDT"));
        assert!(!summary.contains("BTCUSDT"));
        assert!(summary.contains("Total P&L"));
    }

    #[test]
    fn test_flattened_position_still_reported() {
        // A closed position with realized P&L stays in the summary.
        let mut tracker = PnlTracker::new();
        tracker.update_fill(&fill(Instrument::Btc, Side::Buy, dec!(100), dec!(1)));
        tracker.update_fill(&fill(Instrument::Btc, Side::Sell, dec!(110), dec!(1)));

        assert!(tracker.position(Instrument::Btc).is_flat());
        assert!(tracker.summary().contains("BTCUSDT"));
    }
}
