//! # overdraft-types: Core types for Overdraft
//!
//! This crate contains shared types used across the Overdraft system:
//! - Entity IDs ([`UserId`], [`RequestId`])
//! - Monetary amounts ([`Money`])
//! - The user roster entry ([`User`]) and the singleton wallet ([`Wallet`])
//! - Audit trail types ([`AuditAction`], [`AuditStatus`], [`AuditRecord`],
//!   [`AuditEntry`])
//!
//! Everything here is plain data: no IO, no locking. The ledger store owns
//! mutation; these types only describe what it stores.

use std::fmt::{self, Display};
use std::ops::{Add, Sub};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Entity IDs - All Copy (cheap 8-byte values)
// ============================================================================

/// Unique identifier for a user. Preassigned and stable; never generated at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Correlation identifier for one upgrade attempt.
///
/// Ids are handed out by a process-wide counter: pairwise distinct,
/// contiguous from 1 after a reset. Generation order does not need to match
/// completion order.
///
/// # Examples
///
/// ```
/// # use overdraft_types::RequestId;
/// assert_eq!(RequestId::new(7).to_string(), "REQ-007");
/// assert_eq!(RequestId::new(1234).to_string(), "REQ-1234");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REQ-{:03}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// Money
// ============================================================================

/// A signed decimal amount of money.
///
/// Thin wrapper over [`rust_decimal::Decimal`]. Signed on purpose: the
/// vulnerable upgrade path is expected to drive the wallet negative, and the
/// type must be able to represent that.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Constructs an amount from whole currency units.
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${}", -self.0)
        } else {
            write!(f, "${}", self.0)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

// ============================================================================
// Users & Wallet
// ============================================================================

/// One user of the platform.
///
/// The premium flag is set only by a successful upgrade and never transitions
/// back to `false` within the system's lifecycle except via a full reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar_color: String,
    pub is_premium: bool,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a fresh (non-premium) roster entry.
    pub fn seeded(
        id: UserId,
        name: &str,
        email: &str,
        role: &str,
        avatar_color: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            avatar_color: avatar_color.to_string(),
            is_premium: false,
            upgraded_at: None,
            created_at,
        }
    }
}

/// The singleton company wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Money,
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// Audit trail
// ============================================================================

/// Which upgrade path produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The check-then-act path with the open window.
    VulnerableUpgrade,
    /// The fused check+act path.
    AtomicUpgrade,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VulnerableUpgrade => write!(f, "vulnerable_upgrade"),
            Self::AtomicUpgrade => write!(f, "atomic_upgrade"),
        }
    }
}

/// How an upgrade attempt concluded.
///
/// `InsufficientFunds` is an expected business rejection, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    InsufficientFunds,
    Error,
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::InsufficientFunds => write!(f, "rejected-insufficient-funds"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An audit entry as submitted by a caller, before the store stamps it.
///
/// The sequence number and timestamp are assigned by the ledger store at
/// append time; callers only describe what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub user_id: UserId,
    pub balance_before: Money,
    pub balance_after: Money,
    pub status: AuditStatus,
    pub request_id: RequestId,
}

/// One immutable entry in the append-only audit trail.
///
/// Once written, an entry never changes. The sequence number is monotonic
/// and reflects append order — the only total order the system guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub user_id: UserId,
    pub balance_before: Money,
    pub balance_after: Money,
    pub status: AuditStatus,
    pub request_id: RequestId,
}

impl AuditEntry {
    /// Stamps a submitted record with its store-assigned sequence number and
    /// timestamp.
    pub fn stamp(seq: u64, timestamp: DateTime<Utc>, record: AuditRecord) -> Self {
        Self {
            seq,
            timestamp,
            action: record.action,
            user_id: record.user_id,
            balance_before: record.balance_before,
            balance_after: record.balance_after,
            status: record.status,
            request_id: record.request_id,
        }
    }
}
