//! # Adapters Module
//!
//! Implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `codec`: JSON record codec
//! - `ledger`: in-memory and file-backed ledgers

pub mod codec;
pub mod ledger;

pub use codec::JsonRecordCodec;
#[cfg(feature = "file-ledger")]
pub use ledger::FileBackedLedger;
pub use ledger::InMemoryLedger;
