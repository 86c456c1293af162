//! # Title Registry (tc-registry)
//!
//! Land-title registry and sale workflow engine. Tracks parcel ownership,
//! per-office verification, and the multi-party sale process on top of an
//! optimistically-concurrent key-value ledger.
//!
//! ## Sale Workflow
//!
//! ```text
//! Buyer ──submit_or_update_request──→ Estate.requests
//!                                        │
//! Owner ──accept_request───────────────→ Transaction (unapproved)
//!                                        + Estate.beingSold
//!                                        + OfficeAdmin.toApprove
//!                                        │
//! Registrar ──approve_sale─────────────→ owner := buyer, holdings moved,
//!                                        queue entry removed
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Holdings | An estate's owner lists it; no other user does |
//! | 2 | Dense Log | `transactionsCount` equals approved transactions; the pending one is `count + 1` |
//! | 3 | Frozen Sale | `beingSold` implies no open offers and a pending transaction |
//! | 4 | Approval Queue | An office queue holds exactly its pending transactions |
//! | 5 | One Offer per Buyer | Offers on an estate have distinct buyers |
//!
//! ## Concurrency
//!
//! Every call is one `UnitOfWork`: reads are recorded with their version,
//! writes are staged, and the ledger applies the whole write set only if no
//! read went stale. A stale read surfaces as `RegistryError::CommitRejected`;
//! nothing is retried internally.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Records, key scheme, value objects, invariants
//! - `ports/` - Port traits (inbound API, outbound ledger and codec)
//! - `adapters/` - JSON codec, in-memory and file-backed ledgers
//! - `service/` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use tc_registry::{EstateApi, IdentityApi, RegistryService, SuperAdminSeed};
//!
//! let registry = RegistryService::in_memory();
//! registry.init_ledger(&SuperAdminSeed::default())?;
//! registry.create_user("u1", "User One")?;
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
#[cfg(feature = "file-ledger")]
pub use adapters::FileBackedLedger;
pub use adapters::{InMemoryLedger, JsonRecordCodec};
pub use domain::{
    CodecError, Estate, EstateParams, EstatePatch, InvariantViolation, LedgerError, LedgerRecord,
    MAX_TRANSACTIONS_COUNT, OfficeAdmin, OfficeAdminParams, Principal, RecordKey, RegistryError, Request, SaleState,
    SuperAdmin, SuperAdminSeed, Timestamp, TransactionParams, TransactionRecord, TransferReason,
    User, VerificationStatus,
};
pub use ports::inbound::{
    EstateApi, IdentityApi, LedgerInspectionApi, SaleWorkflowApi, TransactionLogApi,
};
pub use ports::outbound::{
    BatchOperation, LedgerStore, ReadSet, RecordCodec, ScanItem, ScanIter, Version,
    VersionedValue, WriteSet,
};
pub use service::{RegistryDependencies, RegistryService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
