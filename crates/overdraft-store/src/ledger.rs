//! The ledger: one shared wallet, a user roster, and the append-only audit
//! trail.
//!
//! State lives in memory as the deterministic projection of the journal
//! (see [`crate::journal`]); opening a ledger replays the journal to rebuild
//! it. Every mutation appends its journal record before touching the
//! projection, inside one write-guard scope, so a mutation is either fully
//! durable or not applied at all.
//!
//! # Concurrency
//!
//! The projection sits behind a `RwLock`. Readers take the read side and
//! never touch the journal file; writers serialize on the write side for the
//! duration of check + journal append + state change. That write guard is
//! what makes [`Ledger::conditional_debit`] a single indivisible step — the
//! funds check and the decrement happen under one guard, the row-level-lock
//! equivalent for the singleton wallet. [`Ledger::write_balance`] offers the
//! same durability with **no** funds check; it exists so the vulnerable
//! upgrade path can overwrite the balance from a stale read.
//!
//! # Invariants
//!
//! - The journal is append-only; existing records are never modified
//!   (truncation on reset starts a new history, it does not edit one)
//! - Audit sequence numbers are assigned here, contiguous from 1
//! - `conditional_debit` never drives the balance negative
//! - `write_balance` carries no such guarantee, deliberately

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use overdraft_types::{AuditEntry, AuditRecord, Money, User, UserId, Wallet};

use crate::error::{Result, StoreError};
use crate::journal::{Journal, JournalRecord};

/// Initial state the ledger is created with and restored to on reset.
#[derive(Debug, Clone)]
pub struct Seed {
    pub balance: Money,
    pub users: Vec<User>,
}

impl Seed {
    /// Default roster with a custom starting balance.
    pub fn with_balance(balance: Money) -> Self {
        Self {
            balance,
            users: default_roster(Utc::now()),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::with_balance(Money::from_major(100))
    }
}

/// The five-person roster the demonstration ships with.
fn default_roster(created_at: DateTime<Utc>) -> Vec<User> {
    [
        (1, "Alice Johnson", "alice@techcorp.io", "Frontend Developer", "#6366f1"),
        (2, "Bob Cohen", "bob@techcorp.io", "UI/UX Designer", "#06b6d4"),
        (3, "Charlie Levy", "charlie@techcorp.io", "Product Manager", "#f59e0b"),
        (4, "Dana Mizrahi", "dana@techcorp.io", "DevOps Engineer", "#10b981"),
        (5, "Avi Ben-David", "avi@techcorp.io", "Team Lead", "#ef4444"),
    ]
    .into_iter()
    .map(|(id, name, email, role, color)| {
        User::seeded(UserId::new(id), name, email, role, color, created_at)
    })
    .collect()
}

/// Result of a conditional debit attempt.
///
/// `balance` is the post-debit balance when `applied`, or the balance that
/// failed the check when not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitOutcome {
    pub applied: bool,
    pub balance: Money,
}

/// In-memory projection of the journal.
#[derive(Debug)]
struct LedgerState {
    balance: Money,
    last_updated: DateTime<Utc>,
    users: BTreeMap<UserId, User>,
    audit: Vec<AuditEntry>,
}

impl LedgerState {
    fn genesis(balance: Money, users: Vec<User>, at: DateTime<Utc>) -> Self {
        Self {
            balance,
            last_updated: at,
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            audit: Vec::new(),
        }
    }

    /// Folds a replayed journal into state.
    ///
    /// The first record must be a `Genesis`; anything else means the journal
    /// head was lost.
    fn from_records(records: Vec<JournalRecord>) -> Result<Self> {
        let mut iter = records.into_iter();
        let mut state = match iter.next() {
            Some(JournalRecord::Genesis { balance, users, at }) => {
                Self::genesis(balance, users, at)
            }
            Some(other) => {
                return Err(StoreError::CorruptJournal {
                    line: 1,
                    reason: format!("expected genesis record, found {other:?}"),
                });
            }
            None => {
                return Err(StoreError::CorruptJournal {
                    line: 1,
                    reason: "journal is empty".to_string(),
                });
            }
        };
        for record in iter {
            state.apply(record);
        }
        Ok(state)
    }

    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Genesis { balance, users, at } => {
                *self = Self::genesis(balance, users, at);
            }
            JournalRecord::BalanceSet { balance, at }
            | JournalRecord::Debit {
                balance_after: balance,
                at,
                ..
            } => {
                self.balance = balance;
                self.last_updated = at;
            }
            JournalRecord::Premium { user_id, at } => {
                if let Some(user) = self.users.get_mut(&user_id) {
                    user.is_premium = true;
                    user.upgraded_at = Some(at);
                }
            }
            JournalRecord::Audit { entry } => {
                self.audit.push(entry);
            }
        }
    }
}

struct Inner {
    state: LedgerState,
    journal: Journal,
}

/// Durable keyed storage for the shared wallet, the user roster, and the
/// audit trail.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Ledger {
    inner: RwLock<Inner>,
    seed: Seed,
}

impl Ledger {
    /// Opens the ledger at `dir` with the default seed, replaying any
    /// existing journal.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(dir, Seed::default())
    }

    /// Opens the ledger at `dir`, seeding a fresh journal if none exists.
    ///
    /// An existing journal wins over `seed` for the current state; `seed`
    /// still defines what [`Ledger::reset`] restores.
    pub fn open_with(dir: impl AsRef<Path>, seed: Seed) -> Result<Self> {
        let dir = dir.as_ref();
        let records = Journal::replay(dir)?;
        let mut journal = Journal::open(dir)?;

        let state = if records.is_empty() {
            let at = Utc::now();
            journal.append(&JournalRecord::Genesis {
                balance: seed.balance,
                users: seed.users.clone(),
                at,
            })?;
            tracing::info!(
                balance = %seed.balance,
                users = seed.users.len(),
                path = %journal.path().display(),
                "seeded fresh ledger"
            );
            LedgerState::genesis(seed.balance, seed.users.clone(), at)
        } else {
            let state = LedgerState::from_records(records)?;
            tracing::info!(
                balance = %state.balance,
                audit_entries = state.audit.len(),
                path = %journal.path().display(),
                "replayed ledger journal"
            );
            state
        };

        Ok(Self {
            inner: RwLock::new(Inner { state, journal }),
            seed,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// The balance the seed (and every reset) starts from.
    pub fn seed_balance(&self) -> Money {
        self.seed.balance
    }

    /// Point-in-time balance read. No guarantee beyond read-committed
    /// visibility: the value may be stale by the time the caller acts on it.
    pub fn read_balance(&self) -> Result<Money> {
        Ok(self.read()?.state.balance)
    }

    /// Wallet snapshot for reporting.
    pub fn wallet(&self) -> Result<Wallet> {
        let guard = self.read()?;
        Ok(Wallet {
            balance: guard.state.balance,
            last_updated: guard.state.last_updated,
        })
    }

    /// The full roster, ordered by user id.
    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.state.users.values().cloned().collect())
    }

    /// Looks up one user.
    pub fn user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.read()?.state.users.get(&user_id).cloned())
    }

    /// Atomically decrements the balance by `amount` if and only if the
    /// current balance covers it.
    ///
    /// Check and decrement happen under one write guard: no other operation
    /// can observe or act on an intermediate state, and concurrent callers
    /// queue rather than interleave. This is the correctness primitive the
    /// atomic upgrade path is built on.
    pub fn conditional_debit(&self, amount: Money) -> Result<DebitOutcome> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        if state.balance < amount {
            tracing::debug!(
                %amount,
                balance = %state.balance,
                "conditional debit refused: insufficient funds"
            );
            return Ok(DebitOutcome {
                applied: false,
                balance: state.balance,
            });
        }

        let at = Utc::now();
        let balance_after = state.balance - amount;
        journal.append(&JournalRecord::Debit {
            amount,
            balance_after,
            at,
        })?;
        state.balance = balance_after;
        state.last_updated = at;

        debug_assert!(
            !state.balance.is_negative(),
            "conditional debit drove the balance negative"
        );

        tracing::debug!(%amount, balance = %balance_after, "conditional debit applied");
        Ok(DebitOutcome {
            applied: true,
            balance: balance_after,
        })
    }

    /// Overwrites the balance unconditionally.
    ///
    /// No funds check, no safety guarantee: the balance is free to go
    /// negative. Exists only so the check-then-act upgrade path can write a
    /// value computed from a stale read.
    pub fn write_balance(&self, new_balance: Money) -> Result<()> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        let at = Utc::now();
        journal.append(&JournalRecord::BalanceSet {
            balance: new_balance,
            at,
        })?;
        state.balance = new_balance;
        state.last_updated = at;

        if new_balance.is_negative() {
            tracing::warn!(balance = %new_balance, "unconditional write drove the wallet negative");
        }
        Ok(())
    }

    /// Sets the premium flag on a user.
    ///
    /// Idempotent for state: re-granting an already-premium user changes
    /// nothing (the caller's audit entry still records the attempt).
    pub fn mark_premium(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        if user.is_premium {
            return Ok(());
        }

        journal.append(&JournalRecord::Premium { user_id, at })?;
        user.is_premium = true;
        user.upgraded_at = Some(at);
        tracing::debug!(%user_id, "premium granted");
        Ok(())
    }

    /// Appends one audit entry, assigning its sequence number and timestamp.
    ///
    /// Returns the assigned sequence number. Ordering is append order — the
    /// only total order the system guarantees.
    pub fn append_audit(&self, record: AuditRecord) -> Result<u64> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        let seq = state.audit.len() as u64 + 1;
        let entry = AuditEntry::stamp(seq, Utc::now(), record);
        journal.append(&JournalRecord::Audit {
            entry: entry.clone(),
        })?;
        state.audit.push(entry);

        debug_assert_eq!(
            state.audit.len() as u64,
            seq,
            "audit sequence out of step with trail length"
        );
        Ok(seq)
    }

    /// The most recent `k` audit entries, newest first.
    pub fn recent_audit(&self, k: usize) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read()?
            .state
            .audit
            .iter()
            .rev()
            .take(k)
            .cloned()
            .collect())
    }

    /// Total number of audit entries written since the last reset.
    pub fn audit_len(&self) -> Result<usize> {
        Ok(self.read()?.state.audit.len())
    }

    /// Drops everything and restores the seed state: seed balance, fresh
    /// roster, empty audit trail.
    ///
    /// Holds the write guard for the whole duration, so in-flight upgrade
    /// calls serialize around the reset: they run entirely before or
    /// entirely after it, never against a half-reset store. Callers should
    /// still quiesce upgrades before resetting if they care about which side
    /// of the reset those calls land on.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.write()?;
        let Inner { state, journal } = &mut *inner;

        journal.truncate()?;
        let at = Utc::now();
        journal.append(&JournalRecord::Genesis {
            balance: self.seed.balance,
            users: self.seed.users.clone(),
            at,
        })?;
        *state = LedgerState::genesis(self.seed.balance, self.seed.users.clone(), at);

        tracing::info!(balance = %self.seed.balance, "ledger reset to seed state");
        Ok(())
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("seed_balance", &self.seed.balance)
            .finish_non_exhaustive()
    }
}
