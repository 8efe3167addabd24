//! Avellaneda-Stoikov optimal quoting.
//!
//! Per tick, given mid price `m`, signed inventory `q` and parameters
//! (gamma, sigma, T, kappa):
//!
//! ```text
//! reservation r = m - q * gamma * sigma^2 * T
//! spread        = gamma * sigma_eff^2 * T + (2/gamma) * ln(1 + gamma/kappa)
//! bid, ask      = r -/+ spread / 2
//! ```
//!
//! `sigma_eff` is the tick's volatility hint when strictly positive, the
//! configured sigma otherwise. The parameter-derived terms (`gamma*sigma^2`,
//! `ln(1 + gamma/kappa)`, `2/gamma`) are precomputed and refreshed on every
//! parameter change, so the per-tick path is a handful of multiplications.

use crate::error::{MmError, Result};
use stoikov_core::{Price, Quote, Size, Tick};

/// Avellaneda-Stoikov model parameters. All strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoterParams {
    /// Risk aversion (gamma).
    pub gamma: f64,
    /// Baseline volatility (sigma), annualised.
    pub sigma: f64,
    /// Time horizon in seconds (T).
    pub time_horizon: f64,
    /// Order-arrival intensity parameter (kappa).
    pub kappa: f64,
}

impl Default for QuoterParams {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            sigma: 0.05,
            time_horizon: 60.0,
            kappa: 1.5,
        }
    }
}

impl QuoterParams {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gamma", self.gamma),
            ("sigma", self.sigma),
            ("time_horizon", self.time_horizon),
            ("kappa", self.kappa),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(MmError::InvalidParameter(format!(
                    "{name} must be strictly positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The A-S quoter with precomputed parameter constants.
#[derive(Debug, Clone)]
pub struct Quoter {
    params: QuoterParams,
    /// gamma * sigma^2, the inventory-drift coefficient.
    gamma_sigma_sq: f64,
    /// ln(1 + gamma/kappa).
    log_term: f64,
    /// 2 / gamma.
    two_over_gamma: f64,
    /// Quoted size per side.
    quote_size: Size,
}

impl Quoter {
    /// Create a quoter, validating all parameters.
    pub fn new(params: QuoterParams) -> Result<Self> {
        params.validate()?;
        let mut quoter = Self {
            params,
            gamma_sigma_sq: 0.0,
            log_term: 0.0,
            two_over_gamma: 0.0,
            quote_size: Size::ONE,
        };
        quoter.refresh_constants();
        Ok(quoter)
    }

    fn refresh_constants(&mut self) {
        let p = &self.params;
        self.gamma_sigma_sq = p.gamma * p.sigma * p.sigma;
        self.log_term = (1.0 + p.gamma / p.kappa).ln();
        self.two_over_gamma = 2.0 / p.gamma;
    }

    fn set_param(&mut self, params: QuoterParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.refresh_constants();
        Ok(())
    }

    /// Replace gamma; rejects non-positive values without changing state.
    pub fn set_risk_aversion(&mut self, gamma: f64) -> Result<()> {
        self.set_param(QuoterParams {
            gamma,
            ..self.params
        })
    }

    /// Replace sigma; rejects non-positive values without changing state.
    pub fn set_volatility(&mut self, sigma: f64) -> Result<()> {
        self.set_param(QuoterParams {
            sigma,
            ..self.params
        })
    }

    /// Replace the time horizon; rejects non-positive values.
    pub fn set_time_horizon(&mut self, time_horizon: f64) -> Result<()> {
        self.set_param(QuoterParams {
            time_horizon,
            ..self.params
        })
    }

    /// Replace kappa; rejects non-positive values.
    pub fn set_order_intensity(&mut self, kappa: f64) -> Result<()> {
        self.set_param(QuoterParams {
            kappa,
            ..self.params
        })
    }

    pub fn params(&self) -> &QuoterParams {
        &self.params
    }

    /// Reservation price: mid biased away from inventory.
    #[inline]
    fn reservation_price(&self, mid: f64, inventory: f64) -> f64 {
        mid - inventory * self.gamma_sigma_sq * self.params.time_horizon
    }

    /// Optimal total spread for the effective volatility.
    #[inline]
    fn optimal_spread(&self, tick_volatility: f64) -> f64 {
        let vol = if tick_volatility > 0.0 {
            tick_volatility
        } else {
            self.params.sigma
        };
        self.params.gamma * vol * vol * self.params.time_horizon
            + self.two_over_gamma * self.log_term
    }

    /// Compute the optimal two-sided quote for one tick.
    ///
    /// `inventory` is the signed position in the tick's instrument. The
    /// result always satisfies `bid < ask` for valid parameters since the
    /// spread is strictly positive.
    pub fn quote(&self, tick: &Tick, inventory: f64, order_id: u64) -> Quote {
        let mid = tick.mid_price().to_f64();
        let reservation = self.reservation_price(mid, inventory);
        let half_spread = self.optimal_spread(tick.volatility) / 2.0;

        Quote::new(
            tick.instrument,
            Price::from_f64(reservation - half_spread),
            Price::from_f64(reservation + half_spread),
            self.quote_size,
            self.quote_size,
            order_id,
        )
    }

    /// Batch variant: element-wise `quote` over parallel slices.
    ///
    /// Fails with `InvalidArgument` when the slices disagree in length; no
    /// quotes are produced in that case.
    pub fn quote_batch(&self, ticks: &[Tick], inventories: &[f64]) -> Result<Vec<Quote>> {
        if ticks.len() != inventories.len() {
            return Err(MmError::InvalidArgument(format!(
                "ticks and inventories must have the same length ({} vs {})",
                ticks.len(),
                inventories.len()
            )));
        }

        Ok(ticks
            .iter()
            .zip(inventories)
            .enumerate()
            .map(|(i, (tick, &inventory))| self.quote(tick, inventory, i as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stoikov_core::Instrument;

    fn default_quoter() -> Quoter {
        Quoter::new(QuoterParams::default()).unwrap()
    }

    fn tick_with_vol(mid: f64, vol: f64) -> Tick {
        // symmetric 10-dollar book around mid keeps mid exact
        Tick::new(
            Instrument::Btc,
            Price::from_f64(mid - 5.0),
            Price::from_f64(mid + 5.0),
            Size::ONE,
            Size::ONE,
            vol,
        )
    }

    #[test]
    fn test_rejects_non_positive_params() {
        for bad in [
            QuoterParams {
                gamma: 0.0,
                ..Default::default()
            },
            QuoterParams {
                sigma: -0.1,
                ..Default::default()
            },
            QuoterParams {
                time_horizon: 0.0,
                ..Default::default()
            },
            QuoterParams {
                kappa: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(Quoter::new(bad).is_err());
        }
    }

    #[test]
    fn test_setter_rejection_keeps_state() {
        let mut quoter = default_quoter();
        let before = *quoter.params();
        assert!(quoter.set_volatility(0.0).is_err());
        assert!(quoter.set_risk_aversion(-1.0).is_err());
        assert_eq!(*quoter.params(), before);
    }

    #[test]
    fn test_bid_below_ask_always() {
        let quoter = default_quoter();
        for mid in [0.5, 45_005.0, 1_000_000.0] {
            for vol in [0.0, 0.001, 0.025, 1.0] {
                for q in [-5.0, -0.3, 0.0, 0.3, 5.0] {
                    let quote = quoter.quote(&tick_with_vol(mid, vol), q, 0);
                    assert!(quote.bid < quote.ask, "mid={mid} vol={vol} q={q}");
                }
            }
        }
    }

    #[test]
    fn test_scenario_flat_inventory() {
        // gamma=0.1, T=60, kappa=1.5, tick vol hint 0.025, q=0:
        // spread = 0.1*0.025^2*60 + (2/0.1)*ln(1 + 0.1/1.5)
        let quoter = default_quoter();
        let tick = tick_with_vol(45_005.0, 0.025);
        let quote = quoter.quote(&tick, 0.0, 0);

        assert!(quote.bid.to_f64() < 45_005.0);
        assert!(quote.ask.to_f64() > 45_005.0);

        let expected_spread = 0.1 * 0.025 * 0.025 * 60.0 + 20.0 * (1.0 + 0.1 / 1.5f64).ln();
        let spread = quote.ask.to_f64() - quote.bid.to_f64();
        assert!((spread - expected_spread).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_long_inventory_skews_down() {
        // q=+2 shifts the reservation price down by 2 * 0.1 * 0.05^2 * 60 = 0.03.
        let quoter = default_quoter();
        let tick = tick_with_vol(45_005.0, 0.025);
        let flat = quoter.quote(&tick, 0.0, 0);
        let long = quoter.quote(&tick, 2.0, 0);

        let reservation = (long.bid.to_f64() + long.ask.to_f64()) / 2.0;
        assert!((reservation - 45_004.97).abs() < 1e-9);

        assert!((flat.bid.to_f64() - long.bid.to_f64() - 0.03).abs() < 1e-9);
        assert!((flat.ask.to_f64() - long.ask.to_f64() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_skew_sign() {
        // Lower inventory -> higher quote mid.
        let quoter = default_quoter();
        let tick = tick_with_vol(45_005.0, 0.025);
        let mut last_mid = f64::INFINITY;
        for q in [-2.0, -1.0, 0.0, 1.0, 2.0] {
            let quote = quoter.quote(&tick, q, 0);
            let mid = (quote.bid.to_f64() + quote.ask.to_f64()) / 2.0;
            assert!(mid < last_mid);
            last_mid = mid;
        }
    }

    #[test]
    fn test_spread_monotone_in_volatility() {
        let quoter = default_quoter();
        let narrow = quoter.quote(&tick_with_vol(45_005.0, 0.025), 0.0, 0);
        let wide = quoter.quote(&tick_with_vol(45_005.0, 0.05), 0.0, 0);
        assert!(wide.spread() > narrow.spread());
    }

    #[test]
    fn test_zero_hint_falls_back_to_configured_sigma() {
        let quoter = default_quoter();
        let hinted = quoter.quote(&tick_with_vol(45_005.0, 0.05), 0.0, 0);
        let absent = quoter.quote(&tick_with_vol(45_005.0, 0.0), 0.0, 0);
        // configured sigma is also 0.05, so the spreads agree
        assert_eq!(hinted.spread(), absent.spread());
    }

    #[test]
    fn test_set_volatility_recomputes_drift() {
        let mut quoter = default_quoter();
        quoter.set_volatility(0.1).unwrap();
        let tick = tick_with_vol(45_005.0, 0.025);

        // drift per unit inventory = gamma * sigma^2 * T = 0.1 * 0.01 * 60
        let flat = quoter.quote(&tick, 0.0, 0);
        let long = quoter.quote(&tick, 1.0, 0);
        let shift = flat.bid.to_f64() - long.bid.to_f64();
        assert!((shift - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_batch_matches_elementwise() {
        let quoter = default_quoter();
        let ticks = vec![
            tick_with_vol(45_005.0, 0.025),
            tick_with_vol(3_000.0, 0.0),
            tick_with_vol(150.0, 0.05),
        ];
        let inventories = vec![0.0, 1.5, -2.0];

        let batch = quoter.quote_batch(&ticks, &inventories).unwrap();
        assert_eq!(batch.len(), 3);
        for (i, quote) in batch.iter().enumerate() {
            let single = quoter.quote(&ticks[i], inventories[i], i as u64);
            assert_eq!(quote.bid, single.bid);
            assert_eq!(quote.ask, single.ask);
        }
    }

    #[test]
    fn test_batch_length_mismatch() {
        let quoter = default_quoter();
        let ticks = vec![tick_with_vol(100.0, 0.0)];
        let err = quoter.quote_batch(&ticks, &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, MmError::InvalidArgument(_)));
    }

    #[test]
    fn test_unit_sizes() {
        let quote = default_quoter().quote(&tick_with_vol(100.0, 0.0), 0.0, 0);
        assert_eq!(quote.bid_size.inner(), dec!(1));
        assert_eq!(quote.ask_size.inner(), dec!(1));
    }
}
