//! # Ledger Inspection Implementation
//!
//! Raw record access for operators. These calls bypass the workflow rules.

use super::helpers::{not_found, require_non_empty};
use super::*;
use crate::domain::{InvariantViolation, LedgerRecord, LedgerSnapshot, RecordKey, RegistryError};
use crate::ports::inbound::LedgerInspectionApi;
use tracing::{info, warn};

impl<L, C> RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    /// Decode `bytes` as the record type `key` names.
    fn decode_record(
        &self,
        op: &'static str,
        key: &RecordKey,
        bytes: &[u8],
    ) -> Result<LedgerRecord, RegistryError> {
        let record = match key {
            RecordKey::SuperAdmin => self.codec.decode(bytes).map(LedgerRecord::SuperAdmin),
            RecordKey::OfficeAdmin(_) => self.codec.decode(bytes).map(LedgerRecord::OfficeAdmin),
            RecordKey::User(_) => self.codec.decode(bytes).map(LedgerRecord::User),
            RecordKey::Estate(_) => self.codec.decode(bytes).map(LedgerRecord::Estate),
            RecordKey::Transaction { .. } => self.codec.decode(bytes).map(LedgerRecord::Transaction),
            RecordKey::Other(_) => {
                return Ok(LedgerRecord::Opaque(String::from_utf8_lossy(bytes).into_owned()))
            }
        };
        record.map_err(|e| RegistryError::codec(op, key.to_string(), e))
    }
}

impl<L, C> LedgerInspectionApi for RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    fn read_raw_record(&self, key: &str) -> Result<LedgerRecord, RegistryError> {
        const OP: &str = "read_raw_record";
        let entry = self
            .ledger
            .get(key.as_bytes())
            .map_err(|e| RegistryError::ledger(OP, e))?
            .ok_or_else(|| not_found(OP, key))?;
        self.decode_record(OP, &RecordKey::parse(key), &entry.value)
    }

    fn delete_record(&self, key: &str) -> Result<(), RegistryError> {
        const OP: &str = "delete_record";
        require_non_empty(OP, "key", key)?;

        let mut uow = self.begin(OP);
        uow.stage_delete(key.as_bytes());
        uow.commit()?;

        warn!("[tc-registry] record {} deleted outside the workflow", key);
        Ok(())
    }

    fn scan_range(&self, start: &str, end: &str) -> Result<Vec<String>, RegistryError> {
        const OP: &str = "scan_range";
        let rows = self
            .ledger
            .range_scan(start.as_bytes(), end.as_bytes())
            .map_err(|e| RegistryError::ledger(OP, e))?;

        rows.map(|row| -> Result<String, RegistryError> {
            let (key, value) = row.map_err(|e| RegistryError::ledger(OP, e))?;
            Ok(format!(
                "Key: {}, Value: {}",
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(&value)
            ))
        })
        .collect()
    }

    fn audit_invariants(&self) -> Result<Vec<InvariantViolation>, RegistryError> {
        const OP: &str = "audit_invariants";
        let rows = self
            .ledger
            .range_scan(b"", &[u8::MAX])
            .map_err(|e| RegistryError::ledger(OP, e))?;

        let mut snapshot = LedgerSnapshot::new();
        let mut scanned = 0usize;
        for row in rows {
            let (raw_key, bytes) = row.map_err(|e| RegistryError::ledger(OP, e))?;
            let key = RecordKey::parse(&String::from_utf8_lossy(&raw_key));
            let record = self.decode_record(OP, &key, &bytes)?;
            snapshot.insert(key, record);
            scanned += 1;
        }

        let violations = snapshot.violations();
        info!(
            "[tc-registry] audited {} records, {} violations",
            scanned,
            violations.len()
        );
        Ok(violations)
    }
}
