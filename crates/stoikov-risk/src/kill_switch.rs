//! Once-only halt latch.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

/// Reason the kill-switch fired.
#[derive(Debug, Clone, PartialEq)]
pub enum HaltReason {
    /// Total P&L breached the configured floor.
    PnlFloor {
        /// P&L at the moment of the breach.
        pnl: Decimal,
        /// The configured floor.
        floor: Decimal,
    },
    /// Manual trigger by the operator.
    Manual { message: String },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PnlFloor { pnl, floor } => {
                write!(f, "P&L ${pnl} breached floor ${floor}")
            }
            Self::Manual { message } => write!(f, "Manual: {message}"),
        }
    }
}

/// Emergency halt latch.
///
/// Once triggered it stays triggered; a second trigger is ignored and the
/// original reason is preserved. The triggered flag is a plain atomic so the
/// per-tick check stays branch-predictable.
pub struct KillSwitch {
    triggered: AtomicBool,
    reason: RwLock<Option<HaltReason>>,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            reason: RwLock::new(None),
        }
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Trip the latch. Idempotent: only the first reason is kept.
    pub fn trigger(&self, reason: HaltReason) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            {
                let mut guard = self.reason.write();
                *guard = Some(reason.clone());
            }
            error!(%reason, "KILL SWITCH TRIGGERED");
        } else {
            warn!(new_reason = %reason, "kill switch already triggered, ignoring");
        }
    }

    /// The reason recorded at trigger time, if any.
    pub fn reason(&self) -> Option<HaltReason> {
        if self.is_triggered() {
            self.reason.read().clone()
        } else {
            None
        }
    }
}
