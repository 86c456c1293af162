//! Ledger Adapters
//!
//! Implementations of the `LedgerStore` trait. Both keep the whole key space
//! in a `BTreeMap` and serialise commits behind one lock.

#[cfg(feature = "file-ledger")]
mod file;
mod memory;

#[cfg(feature = "file-ledger")]
pub use file::FileBackedLedger;
pub use memory::InMemoryLedger;

use crate::domain::errors::LedgerError;
use crate::ports::outbound::{BatchOperation, ReadSet, Version, VersionedValue, WriteSet};
use std::collections::BTreeMap;

/// Versioned key space shared by the reference ledgers.
#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerState {
    pub(crate) entries: BTreeMap<Vec<u8>, VersionedValue>,
    /// Version assigned by the latest non-empty commit.
    pub(crate) clock: Version,
}

impl LedgerState {
    pub(crate) fn get(&self, key: &[u8]) -> Option<VersionedValue> {
        self.entries.get(key).cloned()
    }

    /// Refuse the commit if any key moved since it was read.
    pub(crate) fn validate(&self, read_set: &ReadSet) -> Result<(), LedgerError> {
        for (key, observed) in read_set.iter() {
            let current = self.entries.get(key).map(|v| v.version);
            if current != observed {
                return Err(LedgerError::ReadConflict {
                    key: String::from_utf8_lossy(key).into_owned(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&mut self, write_set: WriteSet) {
        if write_set.is_empty() {
            return;
        }
        self.clock += 1;
        let version = self.clock;
        for op in write_set {
            match op {
                BatchOperation::Put { key, value } => {
                    self.entries.insert(key, VersionedValue { value, version });
                }
                BatchOperation::Delete { key } => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Snapshot of `[start, end)`. Empty when `start >= end`.
    pub(crate) fn range(&self, start: &[u8], end: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        if start >= end {
            return Vec::new();
        }
        self.entries
            .range(start.to_vec()..end.to_vec())
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }
}
