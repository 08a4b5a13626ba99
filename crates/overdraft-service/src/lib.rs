//! # overdraft-service: the two upgrade paths
//!
//! Business logic for "spend from the shared wallet and grant premium",
//! implemented twice over the same ledger:
//!
//! - [`UpgradeService::vulnerable_upgrade`] — check-then-act with an open
//!   window between the check and the write (the race under study)
//! - [`UpgradeService::atomic_upgrade`] — one fused conditional debit
//!
//! Plus the pieces both share: the correlation-id counter, the tagged
//! [`UpgradeOutcome`] matching the external contract, system reset, and the
//! [`StatsSnapshot`] reporting view.

mod outcome;
mod request;
mod service;
mod stats;

pub use outcome::{ResetReceipt, UpgradeOutcome, INSUFFICIENT_FUNDS};
pub use request::RequestCounter;
pub use service::{UpgradeService, DEFAULT_WINDOW};
pub use stats::{CostConfig, StatsSnapshot, UserCounts, WalletStats, AUDIT_TAIL_LEN};
