//! # Title Registry Service
//!
//! The application service implementing every inbound API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `IdentityApi`, `EstateApi`, `SaleWorkflowApi`,
//!    `TransactionLogApi` and `LedgerInspectionApi`
//! 2. Runs each call as one `UnitOfWork` against the ledger
//! 3. Submits all writes of a call in a single commit
//! 4. Uses dependency injection for the ledger and the record codec

mod debug;
mod estates;
mod helpers;
mod identity;
mod transactions;
mod unit_of_work;
mod workflow;

pub(crate) use unit_of_work::UnitOfWork;

use crate::adapters::{InMemoryLedger, JsonRecordCodec};
use crate::ports::outbound::{LedgerStore, RecordCodec};

/// The Title Registry Service.
///
/// Stateless apart from its collaborators: every piece of registry state
/// lives in the ledger.
pub struct RegistryService<L, C = JsonRecordCodec>
where
    L: LedgerStore,
    C: RecordCodec,
{
    /// Versioned key-value ledger.
    pub(crate) ledger: L,
    /// Record encoding.
    pub(crate) codec: C,
}

/// Dependencies for RegistryService
pub struct RegistryDependencies<L, C> {
    pub ledger: L,
    pub codec: C,
}

impl<L, C> RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    /// Create a service over the given collaborators.
    pub fn new(deps: RegistryDependencies<L, C>) -> Self {
        Self {
            ledger: deps.ledger,
            codec: deps.codec,
        }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Start a unit of work for operation `op`.
    pub(crate) fn begin(&self, op: &'static str) -> UnitOfWork<'_, L, C> {
        UnitOfWork::new(op, &self.ledger, &self.codec)
    }
}

impl<L: LedgerStore> RegistryService<L> {
    /// Service over `ledger` with the JSON record codec.
    pub fn with_ledger(ledger: L) -> Self {
        Self::new(RegistryDependencies {
            ledger,
            codec: JsonRecordCodec,
        })
    }
}

impl RegistryService<InMemoryLedger> {
    /// Service over a fresh in-memory ledger.
    pub fn in_memory() -> Self {
        Self::with_ledger(InMemoryLedger::new())
    }
}
