//! # Title-Chain Node
//!
//! Entry point of the `tc-node` operator CLI.
//!
//! ```text
//! tc-node --ledger ./data/ledger.tcl init-ledger
//! tc-node create-user u1 "User One"
//! tc-node submit-request b1 "Buyer One" s001 150
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use tc_node::{dispatch, Cli, Command, LedgerBackend, NodeConfig};
use tc_registry::{FileBackedLedger, LedgerStore, RegistryService};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);

    let _telemetry = tc_telemetry::init_telemetry(config.telemetry.clone())
        .context("failed to initialise telemetry")?;

    if cli.command == Command::InitLedger {
        if let Err(e) = config.validate_for_production() {
            warn!("{}", e);
        }
    }

    let now = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let output = match config.backend {
        LedgerBackend::File => {
            let ledger = open_file_ledger(&config.ledger_path)?;
            execute(ledger, &config, &cli.command, &now)?
        }
        LedgerBackend::Rocksdb => {
            let ledger = open_rocksdb(&config.ledger_path)?;
            execute(ledger, &config, &cli.command, &now)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if cli.print_metrics {
        eprintln!("{}", tc_telemetry::encode_metrics()?);
    }
    Ok(())
}

/// Environment first, CLI flags on top.
fn load_config(cli: &Cli) -> NodeConfig {
    let mut config = NodeConfig::from_env();
    if let Some(path) = &cli.ledger {
        config.ledger_path = path.clone();
    }
    config.backend = cli.backend;
    if let Some(level) = &cli.log_level {
        config.telemetry = config.telemetry.with_log_level(level.clone());
    }
    config
}

fn execute<L: LedgerStore>(
    ledger: L,
    config: &NodeConfig,
    command: &Command,
    now: &str,
) -> Result<Value> {
    let service = RegistryService::with_ledger(ledger);
    dispatch(&service, &config.super_admin, command, now)
        .with_context(|| format!("{} failed", command.operation()))
}

fn open_file_ledger(path: &Path) -> Result<FileBackedLedger> {
    let ledger = FileBackedLedger::open(path)
        .with_context(|| format!("cannot open ledger {}", path.display()))?;
    info!("[tc-node] opened file ledger {}", path.display());
    Ok(ledger)
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(path: &Path) -> Result<tc_node::adapters::RocksDbLedger> {
    use tc_node::adapters::{RocksDbConfig, RocksDbLedger};

    let ledger = RocksDbLedger::open(path, RocksDbConfig::default())
        .with_context(|| format!("cannot open RocksDB ledger {}", path.display()))?;
    info!("[tc-node] opened RocksDB ledger {}", path.display());
    Ok(ledger)
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_path: &Path) -> Result<FileBackedLedger> {
    anyhow::bail!("tc-node was built without the `rocksdb` feature")
}
