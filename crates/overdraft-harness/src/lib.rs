//! # overdraft-harness: the concurrent attack driver
//!
//! Launches N callers against one of the two upgrade paths and collects
//! per-call outcomes. The callers are real OS threads, since the defect
//! under study needs genuine parallelism reaching the vulnerability window
//! at the same wall-clock time, not interleaved cooperative tasks. A
//! rendezvous barrier releases them simultaneously to maximize the chance
//! of colliding reads.
//!
//! The harness drives; it decides nothing. Whether the run demonstrates the
//! race or the defense is read off the [`AttackReport`] afterwards.

use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use overdraft_service::{UpgradeOutcome, UpgradeService};
use overdraft_store::Result;
use overdraft_types::{Money, UserId};

/// Which upgrade path the callers hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackMode {
    /// The check-then-act path with the open window.
    Vulnerable,
    /// The fused check+act path.
    Atomic,
}

impl std::fmt::Display for AttackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vulnerable => write!(f, "vulnerable"),
            Self::Atomic => write!(f, "atomic"),
        }
    }
}

/// One attack run: which path, and which users call it.
#[derive(Debug, Clone)]
pub struct AttackPlan {
    pub mode: AttackMode,
    pub users: Vec<UserId>,
}

impl AttackPlan {
    /// One caller per user id `1..=callers`, matching the seeded roster.
    pub fn new(mode: AttackMode, callers: u64) -> Self {
        Self {
            mode,
            users: (1..=callers).map(UserId::new).collect(),
        }
    }

    /// A plan over an explicit set of callers.
    pub fn with_users(mode: AttackMode, users: Vec<UserId>) -> Self {
        Self { mode, users }
    }
}

/// Outcome of one caller's attempt.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub user_id: UserId,
    pub outcome: UpgradeOutcome,
    pub elapsed: Duration,
}

/// Aggregate result of an attack run.
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub mode: AttackMode,
    /// Per-caller records, sorted by user id.
    pub records: Vec<CallRecord>,
    /// Wall-clock time from barrier release to the last caller finishing.
    pub elapsed: Duration,
    /// Ledger balance after all callers settled.
    pub final_balance: Money,
}

impl AttackReport {
    pub fn granted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_granted())
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_rejected())
            .count()
    }

    pub fn errored(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_error()).count()
    }

    /// Sum of the debits the granted calls reported — what the audit trail
    /// says left the wallet.
    pub fn debited_total(&self) -> Money {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                UpgradeOutcome::Granted {
                    balance_before,
                    balance_after,
                    ..
                } => Some(*balance_before - *balance_after),
                _ => None,
            })
            .fold(Money::ZERO, |acc, d| acc + d)
    }

    /// How far the final balance sits from where the reported debits should
    /// have left it. Zero when the ledger is telling the truth; anything
    /// else means debits were validated against balances that no longer
    /// existed.
    pub fn ledger_drift(&self, seed: Money) -> Money {
        (seed - self.debited_total()) - self.final_balance
    }
}

/// Runs the plan: all callers rendezvous on a barrier, fire simultaneously,
/// and their outcomes are collected as each finishes.
pub fn run(service: &UpgradeService, plan: &AttackPlan) -> Result<AttackReport> {
    if plan.users.is_empty() {
        return Ok(AttackReport {
            mode: plan.mode,
            records: Vec::new(),
            elapsed: Duration::ZERO,
            final_balance: service.ledger().read_balance()?,
        });
    }

    tracing::info!(
        mode = %plan.mode,
        callers = plan.users.len(),
        window = ?service.window(),
        "launching concurrent callers"
    );

    let barrier = Barrier::new(plan.users.len());
    let started = Instant::now();
    let mode = plan.mode;

    let mut records: Vec<CallRecord> = thread::scope(|scope| {
        let handles: Vec<_> = plan
            .users
            .iter()
            .map(|&user_id| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let call_started = Instant::now();
                    let outcome = match mode {
                        AttackMode::Vulnerable => service.vulnerable_upgrade(user_id),
                        AttackMode::Atomic => service.atomic_upgrade(user_id),
                    };
                    CallRecord {
                        user_id,
                        outcome,
                        elapsed: call_started.elapsed(),
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("attack worker panicked"))
            .collect()
    });

    let elapsed = started.elapsed();
    records.sort_by_key(|r| r.user_id);

    let report = AttackReport {
        mode: plan.mode,
        records,
        elapsed,
        final_balance: service.ledger().read_balance()?,
    };

    tracing::info!(
        mode = %report.mode,
        granted = report.granted(),
        rejected = report.rejected(),
        errored = report.errored(),
        final_balance = %report.final_balance,
        elapsed = ?report.elapsed,
        "attack settled"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overdraft_types::RequestId;

    fn report_with(outcomes: Vec<UpgradeOutcome>) -> AttackReport {
        AttackReport {
            mode: AttackMode::Vulnerable,
            records: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| CallRecord {
                    user_id: UserId::new(i as u64 + 1),
                    outcome,
                    elapsed: Duration::ZERO,
                })
                .collect(),
            elapsed: Duration::ZERO,
            final_balance: Money::ZERO,
        }
    }

    #[test]
    fn report_counts_and_debit_total() {
        let report = report_with(vec![
            UpgradeOutcome::Granted {
                request_id: RequestId::new(1),
                message: String::new(),
                balance_before: Money::from_major(100),
                balance_after: Money::ZERO,
            },
            UpgradeOutcome::Granted {
                request_id: RequestId::new(2),
                message: String::new(),
                balance_before: Money::from_major(100),
                balance_after: Money::ZERO,
            },
            UpgradeOutcome::Rejected {
                request_id: RequestId::new(3),
                balance: Money::ZERO,
            },
            UpgradeOutcome::Error {
                request_id: RequestId::new(4),
                message: "boom".to_string(),
            },
        ]);

        assert_eq!(report.granted(), 2);
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.errored(), 1);
        assert_eq!(report.debited_total(), Money::from_major(200));
    }

    #[test]
    fn drift_is_zero_when_the_ledger_adds_up() {
        // One honest grant: seed 100, debit 100, final 0.
        let report = report_with(vec![UpgradeOutcome::Granted {
            request_id: RequestId::new(1),
            message: String::new(),
            balance_before: Money::from_major(100),
            balance_after: Money::ZERO,
        }]);
        assert_eq!(report.ledger_drift(Money::from_major(100)), Money::ZERO);
    }

    #[test]
    fn drift_exposes_debits_the_balance_never_saw() {
        // Two "grants" of 100 but the wallet only moved by 100:
        // seed 100 - audited 200 = expected -100, actual 0 → drift -100.
        let grant = |id: u64| UpgradeOutcome::Granted {
            request_id: RequestId::new(id),
            message: String::new(),
            balance_before: Money::from_major(100),
            balance_after: Money::ZERO,
        };
        let report = report_with(vec![grant(1), grant(2)]);
        assert_eq!(
            report.ledger_drift(Money::from_major(100)),
            Money::from_major(-100)
        );
    }
}
