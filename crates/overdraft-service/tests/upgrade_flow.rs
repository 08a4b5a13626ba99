//! Integration tests for the upgrade service: sequential semantics of both
//! paths, audit completeness, correlation ids, reset, and the stats view.
//!
//! The concurrent attack scenarios live with the harness crate; here every
//! call runs to completion before the next starts.

use std::sync::Arc;
use std::time::Duration;

use overdraft_service::{UpgradeOutcome, UpgradeService};
use overdraft_store::{Ledger, Seed};
use overdraft_types::{AuditStatus, Money, RequestId, UserId};

fn service_with_balance(dir: &std::path::Path, units: i64) -> UpgradeService {
    let ledger =
        Ledger::open_with(dir, Seed::with_balance(Money::from_major(units))).expect("open ledger");
    UpgradeService::new(Arc::new(ledger))
        .with_cost(Money::from_major(100))
        .with_window(Duration::from_millis(1))
}

#[test]
fn atomic_upgrade_grants_then_rejects_when_funds_run_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 100);

    let first = service.atomic_upgrade(UserId::new(1));
    match first {
        UpgradeOutcome::Granted {
            balance_before,
            balance_after,
            ..
        } => {
            assert_eq!(balance_before, Money::from_major(100));
            assert_eq!(balance_after, Money::ZERO);
        }
        other => panic!("expected grant, got {other:?}"),
    }
    assert!(
        service
            .ledger()
            .user(UserId::new(1))
            .expect("read")
            .expect("exists")
            .is_premium
    );

    let second = service.atomic_upgrade(UserId::new(2));
    match second {
        UpgradeOutcome::Rejected { balance, .. } => assert_eq!(balance, Money::ZERO),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(
        !service
            .ledger()
            .user(UserId::new(2))
            .expect("read")
            .expect("exists")
            .is_premium
    );
}

#[test]
fn vulnerable_upgrade_behaves_correctly_without_contention() {
    // Alone, the racy path is indistinguishable from the safe one: the
    // stale read is still fresh when nothing else writes.
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 100);

    let outcome = service.vulnerable_upgrade(UserId::new(4));
    assert!(outcome.is_granted());
    assert_eq!(
        service.ledger().read_balance().expect("read"),
        Money::ZERO
    );

    let rejected = service.vulnerable_upgrade(UserId::new(5));
    assert!(rejected.is_rejected());
    assert_eq!(
        service.ledger().read_balance().expect("read"),
        Money::ZERO
    );
}

#[test]
fn every_call_leaves_exactly_one_audit_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 300);

    service.atomic_upgrade(UserId::new(1)); // granted
    service.atomic_upgrade(UserId::new(2)); // granted
    service.atomic_upgrade(UserId::new(99)); // errors after the debit: unknown user
    service.atomic_upgrade(UserId::new(3)); // rejected, funds gone
    service.vulnerable_upgrade(UserId::new(4)); // rejected at the check

    assert_eq!(service.ledger().audit_len().expect("audit len"), 5);

    let trail = service.ledger().recent_audit(10).expect("recent");
    let statuses: Vec<AuditStatus> = trail.iter().map(|e| e.status).collect();
    // Newest first.
    assert_eq!(
        statuses,
        vec![
            AuditStatus::InsufficientFunds,
            AuditStatus::InsufficientFunds,
            AuditStatus::Error,
            AuditStatus::Success,
            AuditStatus::Success,
        ]
    );
}

#[test]
fn unknown_user_surfaces_as_error_outcome_with_correlation_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 100);

    let outcome = service.atomic_upgrade(UserId::new(42));
    match outcome {
        UpgradeOutcome::Error {
            request_id,
            message,
        } => {
            assert_eq!(request_id, RequestId::new(1));
            assert!(message.contains("unknown user"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn correlation_ids_are_contiguous_and_reset_rewinds_them() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 100);

    let a = service.atomic_upgrade(UserId::new(1));
    let b = service.atomic_upgrade(UserId::new(2));
    let c = service.vulnerable_upgrade(UserId::new(3));
    assert_eq!(a.request_id(), RequestId::new(1));
    assert_eq!(b.request_id(), RequestId::new(2));
    assert_eq!(c.request_id(), RequestId::new(3));

    let receipt = service.reset().expect("reset");
    assert!(receipt.success);
    assert_eq!(receipt.balance, Money::from_major(100));

    let after = service.atomic_upgrade(UserId::new(1));
    assert_eq!(after.request_id(), RequestId::new(1));
}

#[test]
fn reset_restores_the_full_observable_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 100);

    service.atomic_upgrade(UserId::new(1));
    service.atomic_upgrade(UserId::new(2));
    service.reset().expect("reset");

    let snapshot = service.stats().expect("stats");
    assert_eq!(snapshot.wallet.balance, Money::from_major(100));
    assert!(!snapshot.wallet.is_negative);
    assert_eq!(snapshot.stats.premium, 0);
    assert_eq!(snapshot.stats.free, snapshot.stats.total);
    assert!(snapshot.logs.is_empty());
}

#[test]
fn stats_reports_wallet_roster_counts_and_audit_tail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service_with_balance(dir.path(), 300);

    service.atomic_upgrade(UserId::new(1));
    service.atomic_upgrade(UserId::new(2));

    let snapshot = service.stats().expect("stats");
    assert_eq!(snapshot.wallet.balance, Money::from_major(100));
    assert_eq!(snapshot.wallet.initial, Money::from_major(300));
    assert_eq!(snapshot.stats.total, 5);
    assert_eq!(snapshot.stats.premium, 2);
    assert_eq!(snapshot.stats.free, 3);
    assert_eq!(snapshot.config.upgrade_cost, Money::from_major(100));
    assert_eq!(snapshot.logs.len(), 2);
    assert!(snapshot.logs[0].seq > snapshot.logs[1].seq);
}
