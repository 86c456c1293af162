use crate::adapters::ledger::LedgerState;
use crate::domain::errors::LedgerError;
use crate::ports::outbound::{LedgerStore, ReadSet, ScanIter, VersionedValue, WriteSet};
use parking_lot::RwLock;

/// In-memory ledger for tests and ephemeral runs.
///
/// Commits are validated and applied under one write lock, so a stale read
/// set is always detected.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether the ledger holds no keys.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl LedgerStore for InMemoryLedger {
    fn get(&self, key: &[u8]) -> Result<Option<VersionedValue>, LedgerError> {
        Ok(self.state.read().get(key))
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanIter<'_>, LedgerError> {
        let rows = self.state.read().range(start, end);
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn commit(&self, read_set: &ReadSet, write_set: WriteSet) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.validate(read_set)?;
        state.apply(write_set);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(ledger: &InMemoryLedger, key: &[u8], value: &[u8]) {
        let mut writes = WriteSet::new();
        writes.put(key.to_vec(), value.to_vec());
        ledger.commit(&ReadSet::new(), writes).unwrap();
    }

    #[test]
    fn test_in_memory_ledger_versions() {
        let ledger = InMemoryLedger::new();
        put(&ledger, b"key1", b"value1");
        put(&ledger, b"key2", b"value2");

        let first = ledger.get(b"key1").unwrap().unwrap();
        let second = ledger.get(b"key2").unwrap().unwrap();
        assert_eq!(first.value, b"value1".to_vec());
        assert!(second.version > first.version);
        assert_eq!(ledger.get(b"key3").unwrap(), None);
    }

    #[test]
    fn test_stale_read_is_rejected() {
        let ledger = InMemoryLedger::new();
        put(&ledger, b"a", b"1");

        let mut reads = ReadSet::new();
        reads.record(b"a".to_vec(), ledger.get(b"a").unwrap().map(|v| v.version));
        put(&ledger, b"a", b"2");

        let mut writes = WriteSet::new();
        writes.put(b"b".to_vec(), b"x".to_vec());
        let err = ledger.commit(&reads, writes).unwrap_err();
        assert!(matches!(err, LedgerError::ReadConflict { .. }));
        assert_eq!(ledger.get(b"b").unwrap(), None);
    }

    #[test]
    fn test_absent_read_conflicts_with_creation() {
        let ledger = InMemoryLedger::new();
        let mut reads = ReadSet::new();
        reads.record(b"a".to_vec(), None);
        put(&ledger, b"a", b"1");

        let mut writes = WriteSet::new();
        writes.put(b"a".to_vec(), b"2".to_vec());
        assert!(ledger.commit(&reads, writes).is_err());
    }

    #[test]
    fn test_range_scan_is_ordered_and_end_exclusive() {
        let ledger = InMemoryLedger::new();
        put(&ledger, b"user_b", b"2");
        put(&ledger, b"user_a", b"1");
        put(&ledger, b"user_c", b"3");

        let keys: Vec<_> = ledger
            .range_scan(b"user_a", b"user_c")
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"user_a".to_vec(), b"user_b".to_vec()]);

        assert_eq!(ledger.range_scan(b"z", b"a").unwrap().count(), 0);
    }

    #[test]
    fn test_delete_removes_key() {
        let ledger = InMemoryLedger::new();
        put(&ledger, b"a", b"1");
        let mut writes = WriteSet::new();
        writes.delete(b"a".to_vec());
        ledger.commit(&ReadSet::new(), writes).unwrap();
        assert!(ledger.is_empty());
    }
}
