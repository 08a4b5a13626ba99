//! Rendering of stats snapshots and attack reports.
//!
//! Presentation only: everything printed here is read off the structures
//! the core hands back.

use overdraft_harness::{AttackMode, AttackReport};
use overdraft_service::{StatsSnapshot, UpgradeOutcome};
use overdraft_types::Money;

use crate::style::Paint;

/// Prints a section header.
pub fn section(title: &str) {
    println!();
    println!("{}", "=".repeat(60).note());
    println!("  {}", title.strong());
    println!("{}", "=".repeat(60).note());
}

/// Prints a stats snapshot: wallet, roster, and aggregate counts.
pub fn print_snapshot(title: &str, snapshot: &StatsSnapshot) {
    section(title);

    let balance = snapshot.wallet.balance;
    let balance_text = if snapshot.wallet.is_negative {
        balance.to_string().bad()
    } else if balance < snapshot.wallet.initial {
        balance.to_string().caution()
    } else {
        balance.to_string().ok()
    };
    println!(
        "  wallet balance: {balance_text}  {}",
        format!("(seeded {})", snapshot.wallet.initial).dim()
    );
    println!(
        "  users: {} free | {} premium",
        snapshot.stats.free, snapshot.stats.premium
    );

    println!();
    for user in &snapshot.users {
        let status = if user.is_premium {
            "premium".caution()
        } else {
            "free".dim()
        };
        println!("    {} (id {}) - {status}", user.name, user.id);
    }
}

/// Prints the audit tail of a snapshot, newest first.
pub fn print_audit_tail(snapshot: &StatsSnapshot) {
    section("audit trail (newest first)");
    if snapshot.logs.is_empty() {
        println!("  {}", "empty".dim());
        return;
    }
    for entry in &snapshot.logs {
        println!(
            "  #{:<4} {} {} user {} {} -> {} [{}]",
            entry.seq,
            entry.request_id,
            entry.action,
            entry.user_id,
            entry.balance_before,
            entry.balance_after,
            entry.status,
        );
    }
}

/// Prints per-caller outcomes and the run summary.
pub fn print_report(report: &AttackReport, seed: Money) {
    section(&format!("attack results ({} path)", report.mode));

    for record in &report.records {
        match &record.outcome {
            UpgradeOutcome::Granted {
                request_id,
                balance_before,
                balance_after,
                ..
            } => {
                println!(
                    "  {} user {}: upgraded  [{request_id}] {balance_before} -> {balance_after}",
                    "+".ok(),
                    record.user_id,
                );
            }
            UpgradeOutcome::Rejected {
                request_id,
                balance,
            } => {
                println!(
                    "  {} user {}: rejected, insufficient funds  [{request_id}] balance {balance}",
                    "-".bad(),
                    record.user_id,
                );
            }
            UpgradeOutcome::Error {
                request_id,
                message,
            } => {
                println!(
                    "  {} user {}: error  [{request_id}] {message}",
                    "!".caution(),
                    record.user_id,
                );
            }
        }
    }

    println!();
    println!(
        "  {} callers, {} granted, {} rejected, {} errored in {:.3}s",
        report.records.len(),
        report.granted(),
        report.rejected(),
        report.errored(),
        report.elapsed.as_secs_f64(),
    );
    println!("  final balance: {}", report.final_balance);

    print_verdict(report, seed);
}

/// The analysis: did the run demonstrate the race, or the defense?
fn print_verdict(report: &AttackReport, seed: Money) {
    let drift = report.ledger_drift(seed);
    println!();
    match report.mode {
        AttackMode::Vulnerable => {
            if report.granted() > 1 || drift != Money::ZERO {
                println!("  {}", "race reproduced".bad());
                println!(
                    "    {} upgrades granted against a budget for one;",
                    report.granted()
                );
                println!(
                    "    audited debits total {} but the wallet moved by {}",
                    report.debited_total(),
                    seed - report.final_balance,
                );
                println!("    every caller validated the same balance before any of them wrote");
            } else {
                println!(
                    "  {}",
                    "race did not fire (reads did not collide this run)".caution()
                );
            }
        }
        AttackMode::Atomic => {
            if report.granted() <= 1 && drift == Money::ZERO && !report.final_balance.is_negative()
            {
                println!("  {}", "defense held".ok());
                println!(
                    "    {} upgrade granted; check and debit were one indivisible step",
                    report.granted()
                );
            } else {
                println!("  {}", "unexpected: atomic path drifted".bad());
            }
        }
    }
}
