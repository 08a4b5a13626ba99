//! Error types for the ledger store.

use overdraft_types::UserId;
use thiserror::Error;

/// Storage-layer failures.
///
/// These are surfaced to callers as-is; the store performs no retries.
/// Business rejections (insufficient funds) are not errors; the debit
/// primitive reports those through its return value.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The journal could not be replayed.
    #[error("journal corrupt at line {line}: {reason}")]
    CorruptJournal { line: u64, reason: String },

    /// The user id is not in the roster.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// A writer panicked while holding the ledger lock.
    #[error("ledger lock poisoned by a panicked writer")]
    LockPoisoned,

    /// Journal record encoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
