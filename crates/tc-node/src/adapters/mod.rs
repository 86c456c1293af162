//! # Adapters
//!
//! Storage backends the node can open besides the file-backed ledger.
//!
//! ## Modules
//!
//! - `rocksdb_ledger`: RocksDB `LedgerStore` (`rocksdb` feature)

#[cfg(feature = "rocksdb")]
pub mod rocksdb_ledger;

#[cfg(feature = "rocksdb")]
pub use rocksdb_ledger::{RocksDbConfig, RocksDbLedger};
