//! Overdraft command line.
//!
//! Drives the race-condition demonstration end to end: seed a ledger, fire
//! concurrent callers at either upgrade path, and read the forensics.
//!
//! # Quick Start
//!
//! ```bash
//! # Seed the data directory
//! overdraft init
//!
//! # Reproduce the race against the check-then-act path
//! overdraft attack
//!
//! # Same callers against the atomic path
//! overdraft attack --secure
//!
//! # Inspect the wallet, roster, and audit trail
//! overdraft stats
//! ```

mod config;
mod report;
mod style;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use overdraft_harness::{AttackMode, AttackPlan};
use overdraft_service::UpgradeService;
use overdraft_store::{Ledger, Seed};
use overdraft_types::Money;

use crate::config::DemoConfig;
use crate::style::Paint;

/// Overdraft - a check-then-act race, reproduced and closed.
#[derive(Parser)]
#[command(name = "overdraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a config file (default: ./overdraft.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory override.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the ledger (wallet, roster, empty audit trail).
    Init,

    /// Fire concurrent callers at an upgrade path.
    Attack {
        /// Target the atomic path instead of the vulnerable one.
        #[arg(long)]
        secure: bool,

        /// Number of concurrent callers.
        #[arg(long)]
        callers: Option<u64>,

        /// Vulnerability window in milliseconds.
        #[arg(long)]
        window_ms: Option<u64>,
    },

    /// Show wallet, roster, aggregate counts, and the audit tail.
    Stats {
        /// Emit the raw snapshot as JSON instead of the styled view.
        #[arg(long)]
        json: bool,
    },

    /// Restore the seeded state for a fresh run.
    Reset,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = DemoConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        cfg.data_dir = data_dir;
    }

    match cli.command {
        Commands::Init => init(&cfg),
        Commands::Attack {
            secure,
            callers,
            window_ms,
        } => {
            if let Some(callers) = callers {
                cfg.callers = callers;
            }
            if let Some(window_ms) = window_ms {
                cfg.window_ms = window_ms;
            }
            attack(&cfg, secure)
        }
        Commands::Stats { json } => stats(&cfg, json),
        Commands::Reset => reset(&cfg),
    }
}

fn open_service(cfg: &DemoConfig) -> Result<UpgradeService> {
    let seed = Seed::with_balance(Money::from_major(cfg.initial_balance));
    let ledger = Ledger::open_with(&cfg.data_dir, seed)?;
    Ok(UpgradeService::new(Arc::new(ledger))
        .with_cost(Money::from_major(cfg.upgrade_cost))
        .with_window(Duration::from_millis(cfg.window_ms)))
}

fn init(cfg: &DemoConfig) -> Result<()> {
    let service = open_service(cfg)?;
    let snapshot = service.stats()?;
    println!("{} ledger ready at {}", "ok".ok(), cfg.data_dir.display());
    println!("  {} users", snapshot.stats.total);
    println!("  wallet balance: {}", snapshot.wallet.balance);
    println!("  upgrade cost:   {}", snapshot.config.upgrade_cost);
    Ok(())
}

fn attack(cfg: &DemoConfig, secure: bool) -> Result<()> {
    let service = open_service(cfg)?;
    let seed = Money::from_major(cfg.initial_balance);

    let before = service.stats()?;
    report::print_snapshot("status before attack", &before);

    // Re-seed if a previous run already dirtied the state, so every attack
    // starts from the same place.
    if before.stats.premium > 0 || before.wallet.balance != seed {
        println!();
        println!("  {}", "state is not pristine, resetting".caution());
        service.reset()?;
    }

    let mode = if secure {
        AttackMode::Atomic
    } else {
        AttackMode::Vulnerable
    };
    let plan = AttackPlan::new(mode, cfg.callers);

    section_announce(mode, &plan, cfg);
    let report = overdraft_harness::run(&service, &plan)?;
    report::print_report(&report, seed);

    report::print_snapshot("status after attack", &service.stats()?);
    Ok(())
}

fn section_announce(mode: AttackMode, plan: &AttackPlan, cfg: &DemoConfig) {
    report::section(&format!("launching attack ({mode} path)"));
    println!(
        "  {} concurrent callers, released together, {} ms window",
        plan.users.len(),
        cfg.window_ms,
    );
}

fn stats(cfg: &DemoConfig, json: bool) -> Result<()> {
    let service = open_service(cfg)?;
    let snapshot = service.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    report::print_snapshot("system status", &snapshot);
    report::print_audit_tail(&snapshot);
    Ok(())
}

fn reset(cfg: &DemoConfig) -> Result<()> {
    let service = open_service(cfg)?;
    let receipt = service.reset()?;
    println!(
        "{} system reset, balance {}",
        "ok".ok(),
        receipt.balance
    );
    Ok(())
}
