//! Online EWMA volatility estimation.
//!
//! Maintains an exponentially-weighted moving average of squared log-returns
//! and exposes it as an annualised volatility with a configurable floor.
//! The exponential weighting gives a tunable half-life without keeping a
//! return history; the floor prevents the A-S spread from collapsing to zero
//! during flat periods (the model is quadratic in sigma on both the
//! reservation drift and the half-spread).

use stoikov_core::SECONDS_PER_YEAR;
use tracing::warn;

/// Exponentially-weighted volatility estimator over a 1-tick return series.
#[derive(Debug, Clone)]
pub struct EwmaVolatility {
    /// Smoothing factor in (0, 1]. Higher = more responsive.
    alpha: f64,
    /// Annualisation factor: expected ticks per year.
    annualization: f64,
    /// Lower bound on the reported volatility.
    vol_floor: f64,
    /// EWMA of squared log-returns.
    ewma_variance: f64,
    /// Latest annualised, floored volatility estimate.
    current_vol: f64,
    /// Previous observed price.
    last_price: f64,
    /// Set after the first price has been recorded.
    initialized: bool,
}

impl EwmaVolatility {
    /// Create an estimator assuming 1-second tick spacing.
    ///
    /// Before the first update, `current()` reports `initial_vol`.
    pub fn new(alpha: f64, initial_vol: f64, vol_floor: f64) -> Self {
        Self {
            alpha,
            annualization: SECONDS_PER_YEAR,
            vol_floor,
            ewma_variance: 0.0,
            current_vol: initial_vol,
            last_price: 0.0,
            initialized: false,
        }
    }

    /// Override the annualisation factor (ticks per year) for tick spacings
    /// other than one second.
    pub fn with_annualization(mut self, annualization: f64) -> Self {
        self.annualization = annualization;
        self
    }

    /// Feed the next observed price.
    ///
    /// The first call only records the price. A non-positive or non-finite
    /// price is a caller bug: it trips a debug assertion and is otherwise
    /// ignored without mutating any state.
    pub fn update(&mut self, price: f64) {
        if !(price > 0.0) || !price.is_finite() {
            debug_assert!(false, "EwmaVolatility::update called with {price}");
            warn!(price, "ignoring invalid price in volatility estimator");
            return;
        }

        if !self.initialized {
            self.last_price = price;
            self.initialized = true;
            return;
        }

        let log_return = (price / self.last_price).ln();
        self.ewma_variance =
            self.alpha * log_return * log_return + (1.0 - self.alpha) * self.ewma_variance;

        self.current_vol = (self.ewma_variance * self.annualization)
            .sqrt()
            .max(self.vol_floor);
        self.last_price = price;
    }

    /// Latest annualised volatility estimate (the configured initial value
    /// until the second price arrives).
    #[inline]
    pub fn current(&self) -> f64 {
        self.current_vol
    }

    /// Raw EWMA variance of per-tick log-returns.
    #[inline]
    pub fn variance(&self) -> f64 {
        self.ewma_variance
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
