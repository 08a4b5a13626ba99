//! Reporting snapshot types.
//!
//! These are the read-only shapes the dashboard/stats surface consumes.
//! Assembly lives on [`crate::UpgradeService::stats`]; nothing here mutates.

use overdraft_types::{AuditEntry, Money, User};
use serde::Serialize;

/// How many audit entries the snapshot carries (newest first).
pub const AUDIT_TAIL_LEN: usize = 50;

/// Wallet view: current balance against the seeded initial.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WalletStats {
    pub balance: Money,
    pub initial: Money,
    pub is_negative: bool,
}

/// Aggregate roster counts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UserCounts {
    pub total: usize,
    pub premium: usize,
    pub free: usize,
}

/// The cost configuration the demonstration runs with.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CostConfig {
    pub upgrade_cost: Money,
}

/// Everything the reporting surface needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub wallet: WalletStats,
    pub users: Vec<User>,
    pub stats: UserCounts,
    pub logs: Vec<AuditEntry>,
    pub config: CostConfig,
}
