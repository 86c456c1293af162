//! # Node Configuration
//!
//! Ledger location, backend and the SuperAdmin seed.
//!
//! ## Security Requirements
//!
//! - The SuperAdmin secret MUST NOT be the built-in default in production

use std::path::PathBuf;

use tc_registry::SuperAdminSeed;
use tc_telemetry::TelemetryConfig;
use thiserror::Error;

/// Storage backend behind the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LedgerBackend {
    /// Single-file ledger guarded by an exclusive lock.
    #[default]
    File,
    /// RocksDB database directory (`rocksdb` feature).
    Rocksdb,
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Ledger file or database directory.
    pub ledger_path: PathBuf,
    /// Storage backend.
    pub backend: LedgerBackend,
    /// Identity written by `init-ledger`.
    pub super_admin: SuperAdminSeed,
    /// Logging setup.
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("./data/ledger.tcl"),
            backend: LedgerBackend::File,
            super_admin: SuperAdminSeed::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TC_LEDGER_PATH`: Ledger location (default: ./data/ledger.tcl)
    /// - `TC_SUPER_ADMIN_UID`: SuperAdmin uid
    /// - `TC_SUPER_ADMIN_NAME`: SuperAdmin display name
    /// - `TC_SUPER_ADMIN_SECRET`: SuperAdmin credential
    /// - Telemetry variables, see `TelemetryConfig::from_env`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };

        if let Some(path) = lookup("TC_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(uid) = lookup("TC_SUPER_ADMIN_UID") {
            config.super_admin.uid = uid;
        }
        if let Some(name) = lookup("TC_SUPER_ADMIN_NAME") {
            config.super_admin.name = name;
        }
        if let Some(secret) = lookup("TC_SUPER_ADMIN_SECRET") {
            config.super_admin.credential = secret;
        }
        config
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if the SuperAdmin secret is the built-in default.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.super_admin.credential == SuperAdminSeed::default().credential {
            return Err(ConfigError::InsecureSuperAdminSecret);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The SuperAdmin secret was left at its default.
    #[error(
        "SECURITY VIOLATION: SuperAdmin secret is the built-in default. \
         Set TC_SUPER_ADMIN_SECRET before initialising a production ledger."
    )]
    InsecureSuperAdminSecret,
}
