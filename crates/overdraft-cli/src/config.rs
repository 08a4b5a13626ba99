//! Demo configuration.
//!
//! Loaded from `overdraft.toml` when present, with every field defaulting
//! to the canonical demonstration values (balance 100, cost 100, five
//! callers, 500 ms window). Command-line flags override individual fields.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default config filename, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "overdraft.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Where the ledger journal lives.
    pub data_dir: PathBuf,
    /// Seeded wallet balance, in whole currency units.
    pub initial_balance: i64,
    /// Upgrade cost, in whole currency units.
    pub upgrade_cost: i64,
    /// Number of concurrent callers an attack launches.
    pub callers: u64,
    /// Vulnerability window in milliseconds.
    pub window_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./overdraft-data"),
            initial_balance: 100,
            upgrade_cost: 100,
            callers: 5,
            window_ms: 500,
        }
    }
}

impl DemoConfig {
    /// Loads configuration: an explicit `--config` path must exist; the
    /// default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILENAME), false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
