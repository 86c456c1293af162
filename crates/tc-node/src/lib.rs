//! # Title-Chain Node
//!
//! Operator executable for the title registry. Each invocation opens the
//! configured ledger, runs one registry operation and prints the result as
//! JSON on stdout. Logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment, apply CLI overrides
//! 2. Initialise logging and metrics
//! 3. Open the ledger (file lock or RocksDB)
//! 4. Dispatch the command, print the result
//!
//! ## Modular Structure
//!
//! - `cli` - clap command tree, one subcommand per operation
//! - `config` - `NodeConfig` from environment variables
//! - `dispatch` - runs a command against a `RegistryService`
//! - `adapters/` - RocksDB ledger (`rocksdb` feature)

pub mod adapters;
pub mod cli;
pub mod config;
pub mod dispatch;

pub use cli::{Cli, Command};
pub use config::{ConfigError, LedgerBackend, NodeConfig};
pub use dispatch::dispatch;
