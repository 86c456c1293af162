//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the registry requires from the host.
//!
//! The ledger offers single-key reads, ordered range scans and one atomic
//! commit per unit of work. Concurrency is optimistic: every key read is
//! recorded with the version observed, and the commit is refused wholesale
//! if any of those keys moved in the meantime.

use crate::domain::errors::{CodecError, LedgerError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Monotonic version stamped on a key by the commit that last wrote it.
pub type Version = u64;

/// Stored bytes together with their version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Record bytes.
    pub value: Vec<u8>,
    /// Version of the commit that wrote them.
    pub version: Version,
}

/// One `(key, value)` pair produced by a range scan.
pub type ScanItem = Result<(Vec<u8>, Vec<u8>), LedgerError>;

/// Lazy ascending iterator over a key range.
pub type ScanIter<'a> = Box<dyn Iterator<Item = ScanItem> + 'a>;

/// Abstract interface to the versioned key-value ledger.
///
/// Production: `RocksDbLedger` (tc-node, `rocksdb` feature) or `FileBackedLedger`
/// Testing: `InMemoryLedger`
pub trait LedgerStore: Send + Sync {
    /// Current value and version of `key`.
    fn get(&self, key: &[u8]) -> Result<Option<VersionedValue>, LedgerError>;

    /// Keys in `[start, end)`, ascending.
    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanIter<'_>, LedgerError>;

    /// Apply `write_set` atomically if every key of `read_set` still has the
    /// version recorded there.
    ///
    /// ## Atomicity Guarantee
    ///
    /// Either ALL operations in the write set are applied, or NONE are.
    fn commit(&self, read_set: &ReadSet, write_set: WriteSet) -> Result<(), LedgerError>;
}

/// Keys read by a unit of work, with the version observed at first read.
///
/// `None` records that the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    entries: BTreeMap<Vec<u8>, Option<Version>>,
}

impl ReadSet {
    /// Create an empty read set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read. Only the first observation of a key is kept.
    pub fn record(&mut self, key: Vec<u8>, version: Option<Version>) {
        self.entries.entry(key).or_insert(version);
    }

    /// Version recorded for `key`, if it was read.
    pub fn observed(&self, key: &[u8]) -> Option<Option<Version>> {
        self.entries.get(key).copied()
    }

    /// Iterate `(key, observed version)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<Version>)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    /// Number of keys read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was read.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    /// Key the operation targets.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } | BatchOperation::Delete { key } => key,
        }
    }
}

/// Writes staged by a unit of work, last write per key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    ops: BTreeMap<Vec<u8>, BatchOperation>,
}

impl WriteSet {
    /// Create an empty write set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let op = BatchOperation::put(key, value);
        self.ops.insert(op.key().to_vec(), op);
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        let op = BatchOperation::delete(key);
        self.ops.insert(op.key().to_vec(), op);
    }

    /// Staged state of `key`: `Some(Some(v))` put, `Some(None)` deleted,
    /// `None` untouched.
    pub fn staged(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.ops.get(key).map(|op| match op {
            BatchOperation::Put { value, .. } => Some(value.as_slice()),
            BatchOperation::Delete { .. } => None,
        })
    }

    /// Iterate the staged operations in key order.
    pub fn iter(&self) -> impl Iterator<Item = &BatchOperation> {
        self.ops.values()
    }

    /// Number of staged keys.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl IntoIterator for WriteSet {
    type Item = BatchOperation;
    type IntoIter = btree_map::IntoValues<Vec<u8>, BatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_values()
    }
}

/// Abstract interface for record serialization.
pub trait RecordCodec: Send + Sync {
    /// Encode a record into ledger bytes.
    fn encode<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode ledger bytes into a record.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}
