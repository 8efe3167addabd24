//! Passive maker fill model.
//!
//! Quotes only fill when they are competitive: within a small relative
//! distance of the market's best price on their side. One uniform draw per
//! tick covers both sides - `u < p` fills the bid, `u > 1 - p` fills the
//! ask - so a single quote cannot fill both sides unless `p > 0.5`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use stoikov_core::{Fill, Quote, Side, Size, Tick};

/// Samples passive fills against our quotes.
pub struct PassiveFillModel {
    /// Per-side fill probability for a competitive quote.
    probability: f64,
    /// Relative tolerance for the competitive check.
    competitive_eps: Decimal,
    /// Size of each simulated fill.
    fill_size: Size,
    /// Fee fraction of notional (bps / 10^4), signed; negative is a rebate.
    fee_rate: Decimal,
    rng: StdRng,
}

impl PassiveFillModel {
    pub fn new(probability: f64, competitive_eps: Decimal, fill_size: Size, fee_bps: Decimal, seed: u64) -> Self {
        Self {
            probability,
            competitive_eps,
            fill_size,
            fee_rate: fee_bps / Decimal::from(10_000),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn make_fill(&self, quote: &Quote, side: Side) -> Fill {
        let price = match side {
            Side::Buy => quote.bid,
            Side::Sell => quote.ask,
        };
        let fee = self.fill_size.notional(price) * self.fee_rate;
        Fill::new(
            quote.instrument,
            side,
            price,
            self.fill_size,
            quote.order_id,
            fee,
        )
    }

    /// Sample both sides of the quote against the current market.
    pub fn sample(&mut self, quote: &Quote, tick: &Tick) -> (Option<Fill>, Option<Fill>) {
        let bid_competitive = quote.is_competitive(Side::Buy, tick.bid, self.competitive_eps);
        let ask_competitive = quote.is_competitive(Side::Sell, tick.ask, self.competitive_eps);

        let u: f64 = self.rng.gen();

        let bid_fill = (bid_competitive && u < self.probability)
            .then(|| self.make_fill(quote, Side::Buy));
        let ask_fill = (ask_competitive && u > 1.0 - self.probability)
            .then(|| self.make_fill(quote, Side::Sell));

        (bid_fill, ask_fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stoikov_core::{Instrument, Price};

    fn tick() -> Tick {
        Tick::new(
            Instrument::Btc,
            Price::new(dec!(45000)),
            Price::new(dec!(45010)),
            Size::ONE,
            Size::ONE,
            0.0,
        )
    }

    fn competitive_quote() -> Quote {
        // Within 0.1% of both sides of the market.
        Quote::new(
            Instrument::Btc,
            Price::new(dec!(44999)),
            Price::new(dec!(45011)),
            Size::ONE,
            Size::ONE,
            9,
        )
    }

    fn wide_quote() -> Quote {
        Quote::new(
            Instrument::Btc,
            Price::new(dec!(44000)),
            Price::new(dec!(46000)),
            Size::ONE,
            Size::ONE,
            9,
        )
    }

    fn model(probability: f64) -> PassiveFillModel {
        PassiveFillModel::new(probability, dec!(0.001), Size::new(dec!(0.01)), dec!(-1), 7)
    }

    #[test]
    fn test_uncompetitive_quote_never_fills() {
        let mut fills = model(1.0);
        for _ in 0..100 {
            let (bid, ask) = fills.sample(&wide_quote(), &tick());
            assert!(bid.is_none());
            assert!(ask.is_none());
        }
    }

    #[test]
    fn test_competitive_quote_fills_with_certainty() {
        // p = 1.0: u < 1 always and u > 0 always, so both sides fill.
        let mut fills = model(1.0);
        let (bid, ask) = fills.sample(&competitive_quote(), &tick());
        let bid = bid.unwrap();
        let ask = ask.unwrap();

        assert_eq!(bid.side, Side::Buy);
        assert_eq!(bid.price.inner(), dec!(44999));
        assert_eq!(bid.size.inner(), dec!(0.01));
        assert_eq!(ask.side, Side::Sell);
        assert_eq!(ask.price.inner(), dec!(45011));
        assert_eq!(bid.order_id, 9);
    }

    #[test]
    fn test_zero_probability_never_fills() {
        let mut fills = model(0.0);
        for _ in 0..100 {
            let (bid, ask) = fills.sample(&competitive_quote(), &tick());
            assert!(bid.is_none());
            assert!(ask.is_none());
        }
    }

    #[test]
    fn test_rebate_is_negative_fee() {
        let mut fills = model(1.0);
        let (bid, _) = fills.sample(&competitive_quote(), &tick());
        let fill = bid.unwrap();
        // fee = 44999 * 0.01 * (-1bps) = -0.0449999
        assert!(fill.fee < Decimal::ZERO);
        assert_eq!(fill.fee, dec!(44999) * dec!(0.01) * dec!(-0.0001));
    }

    #[test]
    fn test_small_probability_cannot_fill_both_sides() {
        let mut fills = model(0.05);
        for _ in 0..1000 {
            let (bid, ask) = fills.sample(&competitive_quote(), &tick());
            assert!(!(bid.is_some() && ask.is_some()));
        }
    }

    #[test]
    fn test_seeded_model_is_deterministic() {
        let mut a = model(0.5);
        let mut b = model(0.5);
        for _ in 0..50 {
            let (ba, aa) = a.sample(&competitive_quote(), &tick());
            let (bb, ab) = b.sample(&competitive_quote(), &tick());
            assert_eq!(ba.is_some(), bb.is_some());
            assert_eq!(aa.is_some(), ab.is_some());
        }
    }
}
