//! The demonstration scenarios: the same five callers against each upgrade
//! path, over a wallet that can afford exactly one of them.
//!
//! The window is shrunk from the 500 ms default to keep the suite quick; it
//! still dwarfs a balance read by orders of magnitude, which is all the
//! race needs.

use std::sync::Arc;
use std::time::Duration;

use overdraft_harness::{run, AttackMode, AttackPlan};
use overdraft_service::UpgradeService;
use overdraft_store::{Ledger, Seed};
use overdraft_types::{Money, UserId};

const COST: i64 = 100;

fn demo_service(dir: &std::path::Path, window_ms: u64) -> UpgradeService {
    let ledger =
        Ledger::open_with(dir, Seed::with_balance(Money::from_major(100))).expect("open ledger");
    UpgradeService::new(Arc::new(ledger))
        .with_cost(Money::from_major(COST))
        .with_window(Duration::from_millis(window_ms))
}

#[test]
fn atomic_path_admits_exactly_one_of_five_concurrent_callers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = demo_service(dir.path(), 50);
    service.reset().expect("reset");

    let report = run(&service, &AttackPlan::new(AttackMode::Atomic, 5)).expect("run");

    assert_eq!(report.granted(), 1);
    assert_eq!(report.rejected(), 4);
    assert_eq!(report.errored(), 0);
    assert_eq!(report.final_balance, Money::ZERO);
    assert!(!report.final_balance.is_negative());
    assert_eq!(report.ledger_drift(Money::from_major(100)), Money::ZERO);

    // Exactly the granted caller went premium.
    let premium: Vec<UserId> = service
        .ledger()
        .users()
        .expect("users")
        .into_iter()
        .filter(|u| u.is_premium)
        .map(|u| u.id)
        .collect();
    assert_eq!(premium.len(), 1);
    let granted_user = report
        .records
        .iter()
        .find(|r| r.outcome.is_granted())
        .map(|r| r.user_id)
        .expect("one grant");
    assert_eq!(premium, vec![granted_user]);
}

#[test]
fn vulnerable_path_grants_more_upgrades_than_the_budget_allows() {
    let dir = tempfile::tempdir().expect("tempdir");
    // 250 ms window: the five barrier-released reads land within a few
    // hundred microseconds of each other, far inside it.
    let service = demo_service(dir.path(), 250);
    service.reset().expect("reset");

    let report = run(&service, &AttackPlan::new(AttackMode::Vulnerable, 5)).expect("run");

    // One cost-unit of budget, yet more than one caller validated against
    // it and went through.
    assert!(
        report.granted() >= 2,
        "expected colliding grants, got {} (window too narrow for this host?)",
        report.granted()
    );

    // The audited debits no longer reconcile with the wallet movement.
    let drift = report.ledger_drift(Money::from_major(100));
    assert_ne!(
        drift,
        Money::ZERO,
        "audited debits unexpectedly reconciled with the balance delta"
    );

    // Each colliding writer computed 100 - 100 = 0 from its stale read, so
    // the wallet cannot have ended up above zero.
    assert!(report.final_balance <= Money::ZERO);

    // Every granted caller was marked premium off a single validated unit.
    let premium = service
        .ledger()
        .users()
        .expect("users")
        .iter()
        .filter(|u| u.is_premium)
        .count();
    assert_eq!(premium, report.granted());
    assert!(premium >= 2);
}

#[test]
fn audit_trail_records_every_concurrent_caller() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = demo_service(dir.path(), 20);
    service.reset().expect("reset");

    let report = run(&service, &AttackPlan::new(AttackMode::Atomic, 5)).expect("run");
    assert_eq!(report.records.len(), 5);
    assert_eq!(service.ledger().audit_len().expect("audit len"), 5);

    // Sequence numbers are the append order: contiguous from 1.
    let mut seqs: Vec<u64> = service
        .ledger()
        .recent_audit(10)
        .expect("recent")
        .iter()
        .map(|e| e.seq)
        .collect();
    seqs.sort_unstable();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}

#[test]
fn correlation_ids_stay_distinct_and_contiguous_across_concurrent_calls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = demo_service(dir.path(), 20);
    service.reset().expect("reset");

    let report = run(&service, &AttackPlan::new(AttackMode::Atomic, 5)).expect("run");

    let mut ids: Vec<u64> = report
        .records
        .iter()
        .map(|r| r.outcome.request_id().as_u64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn rerunning_after_reset_reproduces_the_defense() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = demo_service(dir.path(), 20);

    for _ in 0..2 {
        service.reset().expect("reset");
        let report = run(&service, &AttackPlan::new(AttackMode::Atomic, 5)).expect("run");
        assert_eq!(report.granted(), 1);
        assert_eq!(report.final_balance, Money::ZERO);
    }
}
