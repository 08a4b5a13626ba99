//! Append-only journal backing the ledger.
//!
//! Every mutation is appended (and synced) here before the in-memory
//! projection changes, so the file is always at least as new as what callers
//! observe. Readers never open this file: point-in-time reads proceed
//! against the projection while a writer appends, which is what lets the
//! demonstration run genuinely concurrent callers instead of serializing
//! them behind a whole-file lock.
//!
//! # File Layout
//!
//! ```text
//! {data_dir}/
//! └── ledger.journal    <- one JSON record per line, append-only
//! ```
//!
//! A `Genesis` record begins every history (initialization and each reset);
//! replaying the file from the top deterministically rebuilds the ledger
//! state.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use overdraft_types::{AuditEntry, Money, User, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Journal filename inside the data directory.
pub const JOURNAL_FILENAME: &str = "ledger.journal";

/// One durable journal record.
///
/// The in-memory ledger state is the deterministic fold of these records in
/// write order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalRecord {
    /// Seed state. Written once at initialization and again on every reset.
    Genesis {
        balance: Money,
        users: Vec<User>,
        at: DateTime<Utc>,
    },
    /// Unconditional balance overwrite. No guard; the balance may go
    /// negative.
    BalanceSet { balance: Money, at: DateTime<Utc> },
    /// An applied conditional debit.
    Debit {
        amount: Money,
        balance_after: Money,
        at: DateTime<Utc>,
    },
    /// Premium entitlement granted to a user.
    Premium { user_id: UserId, at: DateTime<Utc> },
    /// One audit trail entry, already stamped with its sequence number.
    Audit { entry: AuditEntry },
}

/// Append handle for the journal file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Opens the journal for appending, creating the file (and the data
    /// directory) if absent.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILENAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Returns the journal file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and syncs it to disk.
    pub fn append(&mut self, record: &JournalRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Reads every record currently in the journal, in write order.
    ///
    /// A missing file is an empty history, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptJournal`] if any line fails to decode.
    pub fn replay(dir: &Path) -> Result<Vec<JournalRecord>> {
        let path = dir.join(JOURNAL_FILENAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record =
                serde_json::from_str(&line).map_err(|e| StoreError::CorruptJournal {
                    line: idx as u64 + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Discards the entire history. The next append starts a fresh journal.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        Ok(())
    }
}
