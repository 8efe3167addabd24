//! Risk supervision for the quoting pipeline.
//!
//! Two mechanisms, both applied after quote computation and before emission:
//! - inventory-proportional spread inflation once the position exceeds half
//!   of the configured maximum
//! - a P&L kill-switch that latches `Halted` when total P&L breaches the
//!   configured floor

pub mod kill_switch;
pub mod supervisor;

pub use kill_switch::{HaltReason, KillSwitch};
pub use supervisor::{RiskConfig, RiskSupervisor, RiskVerdict};
