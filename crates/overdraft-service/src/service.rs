//! The upgrade service: two competing implementations of "debit the wallet,
//! grant premium".
//!
//! [`UpgradeService::vulnerable_upgrade`] splits the funds check and the
//! balance write across two independent store round trips with a deliberate
//! suspension between them — the classic check-then-act shape. In the gap,
//! any number of concurrent callers can pass the same check against the same
//! balance.
//!
//! [`UpgradeService::atomic_upgrade`] hands the whole problem to the store's
//! conditional debit, which fuses check and act under one guard. No gap, no
//! race.
//!
//! Per call, both paths move through the same phases: check, (window,
//! vulnerable only), act, audit. Every call appends exactly one audit entry
//! whatever its outcome, and the service never retries: a retry would
//! alter the interleaving under study.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use overdraft_store::{Ledger, Result, StoreError};
use overdraft_types::{AuditAction, AuditRecord, AuditStatus, Money, RequestId, UserId};

use crate::outcome::{ResetReceipt, UpgradeOutcome};
use crate::request::RequestCounter;
use crate::stats::{CostConfig, StatsSnapshot, UserCounts, WalletStats, AUDIT_TAIL_LEN};

/// Default simulated payment-gateway latency for the vulnerable path.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// The upgrade service. Cheap to share across caller threads; all methods
/// take `&self`.
#[derive(Debug)]
pub struct UpgradeService {
    ledger: Arc<Ledger>,
    requests: RequestCounter,
    cost: Money,
    window: Duration,
}

impl UpgradeService {
    /// Creates a service over `ledger` with the default cost ($100) and
    /// window (500 ms).
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            requests: RequestCounter::new(),
            cost: Money::from_major(100),
            window: DEFAULT_WINDOW,
        }
    }

    /// Sets the upgrade cost.
    pub fn with_cost(mut self, cost: Money) -> Self {
        self.cost = cost;
        self
    }

    /// Sets the vulnerability window. Tests shrink this to keep suites
    /// fast; it only needs to dwarf a balance read's latency.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn cost(&self) -> Money {
        self.cost
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// The check-then-act upgrade. Deliberately racy — the negative
    /// exhibit, kept faithful to the bug it demonstrates.
    ///
    /// Reads the balance, validates it, then *suspends* for the configured
    /// window before writing back a balance computed from the now-stale
    /// read. Concurrent callers that read during the window all pass the
    /// same check and all write, so the wallet ends up reflecting only the
    /// last writer while every one of them grants premium.
    pub fn vulnerable_upgrade(&self, user_id: UserId) -> UpgradeOutcome {
        let request_id = self.requests.next_id();
        match self.vulnerable_inner(user_id, request_id) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(AuditAction::VulnerableUpgrade, user_id, request_id, &err)
            }
        }
    }

    fn vulnerable_inner(
        &self,
        user_id: UserId,
        request_id: RequestId,
    ) -> Result<UpgradeOutcome> {
        // CHECK: one point-in-time read, held in memory from here on.
        let balance_before = self.ledger.read_balance()?;
        tracing::info!(%request_id, %user_id, balance = %balance_before, "read balance");

        if balance_before < self.cost {
            self.ledger.append_audit(AuditRecord {
                action: AuditAction::VulnerableUpgrade,
                user_id,
                balance_before,
                balance_after: balance_before,
                status: AuditStatus::InsufficientFunds,
                request_id,
            })?;
            tracing::info!(%request_id, %user_id, "rejected: insufficient funds");
            return Ok(UpgradeOutcome::Rejected {
                request_id,
                balance: balance_before,
            });
        }
        tracing::info!(%request_id, cost = %self.cost, "check passed, processing payment");

        // WINDOW: simulated gateway latency. No lock is held, so other
        // callers read the same balance and pass the same check right here.
        thread::sleep(self.window);

        // ACT: the write uses the value captured before the window; the
        // fresh read below is discarded. Propagating it would repair the bug.
        let _current = self.ledger.read_balance()?;
        let new_balance = balance_before - self.cost;
        self.ledger.write_balance(new_balance)?;
        self.ledger.mark_premium(user_id, Utc::now())?;

        self.ledger.append_audit(AuditRecord {
            action: AuditAction::VulnerableUpgrade,
            user_id,
            balance_before,
            balance_after: new_balance,
            status: AuditStatus::Success,
            request_id,
        })?;
        tracing::info!(
            %request_id,
            %user_id,
            balance_before = %balance_before,
            balance_after = %new_balance,
            "upgrade granted from stale read"
        );

        Ok(UpgradeOutcome::Granted {
            request_id,
            message: format!("user {user_id} upgraded"),
            balance_before,
            balance_after: new_balance,
        })
    }

    /// The atomic upgrade. Check and debit are one indivisible store
    /// operation; concurrent callers queue on the wallet instead of racing.
    pub fn atomic_upgrade(&self, user_id: UserId) -> UpgradeOutcome {
        let request_id = self.requests.next_id();
        match self.atomic_inner(user_id, request_id) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(AuditAction::AtomicUpgrade, user_id, request_id, &err)
            }
        }
    }

    fn atomic_inner(&self, user_id: UserId, request_id: RequestId) -> Result<UpgradeOutcome> {
        let debit = self.ledger.conditional_debit(self.cost)?;

        if !debit.applied {
            self.ledger.append_audit(AuditRecord {
                action: AuditAction::AtomicUpgrade,
                user_id,
                balance_before: debit.balance,
                balance_after: debit.balance,
                status: AuditStatus::InsufficientFunds,
                request_id,
            })?;
            tracing::info!(
                %request_id,
                %user_id,
                balance = %debit.balance,
                "rejected: atomic check refused the debit"
            );
            return Ok(UpgradeOutcome::Rejected {
                request_id,
                balance: debit.balance,
            });
        }

        let balance_before = debit.balance + self.cost;
        self.ledger.mark_premium(user_id, Utc::now())?;

        self.ledger.append_audit(AuditRecord {
            action: AuditAction::AtomicUpgrade,
            user_id,
            balance_before,
            balance_after: debit.balance,
            status: AuditStatus::Success,
            request_id,
        })?;
        tracing::info!(
            %request_id,
            %user_id,
            balance_before = %balance_before,
            balance_after = %debit.balance,
            "upgrade granted atomically"
        );

        Ok(UpgradeOutcome::Granted {
            request_id,
            message: format!("user {user_id} upgraded"),
            balance_before,
            balance_after: debit.balance,
        })
    }

    /// Converts a storage failure into an error outcome, best-effort
    /// recording it in the audit trail first.
    fn record_failure(
        &self,
        action: AuditAction,
        user_id: UserId,
        request_id: RequestId,
        err: &StoreError,
    ) -> UpgradeOutcome {
        tracing::error!(%request_id, %user_id, error = %err, "upgrade failed");

        let observed = self.ledger.read_balance().unwrap_or(Money::ZERO);
        if let Err(audit_err) = self.ledger.append_audit(AuditRecord {
            action,
            user_id,
            balance_before: observed,
            balance_after: observed,
            status: AuditStatus::Error,
            request_id,
        }) {
            tracing::warn!(
                %request_id,
                error = %audit_err,
                "failure could not be recorded in the audit trail"
            );
        }

        UpgradeOutcome::Error {
            request_id,
            message: err.to_string(),
        }
    }

    /// Restores the seeded state and rewinds the correlation counter.
    ///
    /// The ledger serializes this against in-flight upgrades; see
    /// [`Ledger::reset`] for the boundary.
    pub fn reset(&self) -> Result<ResetReceipt> {
        self.ledger.reset()?;
        self.requests.rewind();
        let balance = self.ledger.seed_balance();
        tracing::info!(%balance, "system reset");
        Ok(ResetReceipt {
            success: true,
            balance,
        })
    }

    /// Assembles the reporting snapshot: wallet, roster, aggregate counts,
    /// the audit tail (newest first), and the cost configuration.
    pub fn stats(&self) -> Result<StatsSnapshot> {
        let wallet = self.ledger.wallet()?;
        let users = self.ledger.users()?;
        let logs = self.ledger.recent_audit(AUDIT_TAIL_LEN)?;

        let premium = users.iter().filter(|u| u.is_premium).count();
        let total = users.len();

        Ok(StatsSnapshot {
            wallet: WalletStats {
                balance: wallet.balance,
                initial: self.ledger.seed_balance(),
                is_negative: wallet.balance.is_negative(),
            },
            stats: UserCounts {
                total,
                premium,
                free: total - premium,
            },
            users,
            logs,
            config: CostConfig {
                upgrade_cost: self.cost,
            },
        })
    }
}
