//! # Unit of Work
//!
//! Collects the read set and the write set of one registry call.
//!
//! Reads consult staged writes first, so a call observes its own changes.
//! Ledger reads record the version seen on first access; `commit` hands both
//! sets to the ledger, which refuses the whole batch if any read went stale.

use super::helpers::not_found;
use crate::domain::{Principal, PrincipalKind, RecordKey, RegistryError};
use crate::ports::outbound::{LedgerStore, ReadSet, RecordCodec, WriteSet};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) struct UnitOfWork<'a, L, C> {
    op: &'static str,
    ledger: &'a L,
    codec: &'a C,
    reads: ReadSet,
    writes: WriteSet,
}

impl<'a, L, C> UnitOfWork<'a, L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    pub(crate) fn new(op: &'static str, ledger: &'a L, codec: &'a C) -> Self {
        Self {
            op,
            ledger,
            codec,
            reads: ReadSet::new(),
            writes: WriteSet::new(),
        }
    }

    /// Raw bytes at `key`, staged writes first.
    pub(crate) fn read_bytes(
        &mut self,
        key: &RecordKey,
    ) -> Result<Option<Vec<u8>>, RegistryError> {
        let raw = key.to_bytes();
        if let Some(staged) = self.writes.staged(&raw) {
            return Ok(staged.map(<[u8]>::to_vec));
        }
        let found = self
            .ledger
            .get(&raw)
            .map_err(|e| RegistryError::ledger(self.op, e))?;
        self.reads.record(raw, found.as_ref().map(|v| v.version));
        Ok(found.map(|v| v.value))
    }

    /// Decode the record at `key`, `None` if absent.
    pub(crate) fn load_optional<T: DeserializeOwned>(
        &mut self,
        key: &RecordKey,
    ) -> Result<Option<T>, RegistryError> {
        match self.read_bytes(key)? {
            Some(bytes) => self.decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Decode the record at `key`, `NotFound` if absent.
    pub(crate) fn load<T: DeserializeOwned>(&mut self, key: &RecordKey) -> Result<T, RegistryError> {
        self.load_optional(key)?.ok_or_else(|| not_found(self.op, key))
    }

    /// Whether `key` holds a record. Absence is recorded in the read set too.
    pub(crate) fn exists(&mut self, key: &RecordKey) -> Result<bool, RegistryError> {
        Ok(self.read_bytes(key)?.is_some())
    }

    /// Decode the principal stored at `key` as the role its prefix names.
    pub(crate) fn load_principal(&mut self, key: &RecordKey) -> Result<Principal, RegistryError> {
        let bytes = self
            .read_bytes(key)?
            .ok_or_else(|| not_found(self.op, key))?;
        let kind = key.principal_kind().ok_or_else(|| RegistryError::MalformedRecord {
            op: self.op,
            key: key.to_string(),
            reason: "key does not name a principal".to_string(),
        })?;
        Ok(match kind {
            PrincipalKind::SuperAdmin => Principal::SuperAdmin(self.decode(key, &bytes)?),
            PrincipalKind::OfficeAdmin => Principal::OfficeAdmin(self.decode(key, &bytes)?),
            PrincipalKind::User => Principal::User(self.decode(key, &bytes)?),
        })
    }

    /// Load the principal at `key` and check `secret` against it.
    pub(crate) fn authenticate(
        &mut self,
        key: &RecordKey,
        secret: &str,
    ) -> Result<Principal, RegistryError> {
        let principal = self.load_principal(key)?;
        if principal.credential() != secret {
            return Err(RegistryError::CredentialMismatch {
                op: self.op,
                key: key.to_string(),
            });
        }
        Ok(principal)
    }

    /// Stage `record` at `key`.
    pub(crate) fn stage<T: Serialize>(
        &mut self,
        key: &RecordKey,
        record: &T,
    ) -> Result<(), RegistryError> {
        let bytes = self
            .codec
            .encode(record)
            .map_err(|e| RegistryError::codec(self.op, key.to_string(), e))?;
        self.writes.put(key.to_bytes(), bytes);
        Ok(())
    }

    /// Stage removal of the exact ledger key `raw_key`.
    pub(crate) fn stage_delete(&mut self, raw_key: &[u8]) {
        self.writes.delete(raw_key.to_vec());
    }

    /// Submit the staged writes. A unit with nothing staged commits nothing.
    pub(crate) fn commit(self) -> Result<usize, RegistryError> {
        let written = self.writes.len();
        if written == 0 {
            return Ok(0);
        }
        let op = self.op;
        self.ledger
            .commit(&self.reads, self.writes)
            .map_err(|e| RegistryError::ledger(op, e))?;
        Ok(written)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        key: &RecordKey,
        bytes: &[u8],
    ) -> Result<T, RegistryError> {
        self.codec
            .decode(bytes)
            .map_err(|e| RegistryError::codec(self.op, key.to_string(), e))
    }
}
