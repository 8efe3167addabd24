//! Risk supervisor: spread inflation and the P&L floor check.

use crate::kill_switch::{HaltReason, KillSwitch};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stoikov_core::{Price, Quote};
use tracing::debug;

/// Risk configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Maximum absolute position before inventory controls saturate.
    pub max_inventory: Decimal,
    /// Halt quoting once total P&L falls to or below this level.
    pub kill_floor: Decimal,
    /// Scale of the spread inflation as inventory approaches the maximum.
    pub max_spread_multiplier: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_inventory: dec!(0.1),
            kill_floor: dec!(-10),
            max_spread_multiplier: dec!(3),
        }
    }
}

/// Outcome of the per-quote risk check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskVerdict {
    Continue,
    Halt,
}

/// Widens quotes as inventory grows and halts quoting when P&L breaches the
/// configured floor.
pub struct RiskSupervisor {
    config: RiskConfig,
    kill_switch: KillSwitch,
}

impl RiskSupervisor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            kill_switch: KillSwitch::new(),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }

    /// Inventory-proportional spread inflation.
    ///
    /// Below half of `max_inventory` this is a no-op. Above it the spread is
    /// scaled by `1 + (ratio - 0.5) * max_spread_multiplier`, applied
    /// symmetrically around the quote centre.
    pub fn apply_inventory_widening(&self, quote: &mut Quote, inventory: Decimal) {
        if self.config.max_inventory <= Decimal::ZERO {
            return;
        }

        let ratio = inventory.abs() / self.config.max_inventory;
        if ratio <= dec!(0.5) {
            return;
        }

        let multiplier = Decimal::ONE + (ratio - dec!(0.5)) * self.config.max_spread_multiplier;
        let adjustment = (multiplier - Decimal::ONE) * quote.spread().inner() / Decimal::TWO;

        quote.bid = quote.bid - Price::new(adjustment);
        quote.ask = quote.ask + Price::new(adjustment);

        debug!(
            instrument = %quote.instrument,
            %ratio,
            %multiplier,
            "inventory spread widening applied"
        );
    }

    /// P&L kill-switch check. Trips the latch (once) on a breach.
    pub fn check_pnl(&self, total_pnl: Decimal) -> RiskVerdict {
        if self.kill_switch.is_triggered() {
            return RiskVerdict::Halt;
        }
        if total_pnl <= self.config.kill_floor {
            self.kill_switch.trigger(HaltReason::PnlFloor {
                pnl: total_pnl,
                floor: self.config.kill_floor,
            });
            return RiskVerdict::Halt;
        }
        RiskVerdict::Continue
    }
}
