//! # RocksDB Ledger Adapter
//!
//! Production RocksDB implementation of the `LedgerStore` trait.
//!
//! ## Column Families
//!
//! - `records` - registry records, each stored as `version (u64 BE) ‖ bytes`
//! - `metadata` - the commit clock
//!
//! ## Commits
//!
//! Commits are serialised behind a mutex: the read set is validated against
//! the current versions, then every write plus the advanced clock goes out in
//! one `WriteBatch`. Readers never take the mutex.

use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tc_registry::{
    BatchOperation, LedgerError, LedgerStore, ReadSet, ScanIter, Version, VersionedValue,
    WriteSet,
};

/// Column family holding registry records
pub const CF_RECORDS: &str = "records";
/// Column family holding ledger metadata
pub const CF_METADATA: &str = "metadata";

/// All column families used by the ledger
pub const COLUMN_FAMILIES: &[&str] = &[CF_RECORDS, CF_METADATA];

const CLOCK_KEY: &[u8] = b"clock";
const VERSION_LEN: usize = 8;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each commit (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing() -> Self {
        Self {
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed versioned ledger
pub struct RocksDbLedger {
    db: DB,
    commit_lock: Mutex<()>,
    sync_writes: bool,
}

impl RocksDbLedger {
    /// Open or create a ledger database at `path`.
    pub fn open(path: impl AsRef<Path>, config: RocksDbConfig) -> Result<Self, LedgerError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors).map_err(|e| {
            LedgerError::Io {
                message: format!("Failed to open RocksDB: {}", e),
            }
        })?;

        Ok(Self {
            db,
            commit_lock: Mutex::new(()),
            sync_writes: config.sync_writes,
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, LedgerError> {
        self.db.cf_handle(name).ok_or_else(|| LedgerError::Corrupted {
            message: format!("column family `{}` missing", name),
        })
    }

    fn clock(&self) -> Result<Version, LedgerError> {
        let raw = self
            .db
            .get_cf(self.cf(CF_METADATA)?, CLOCK_KEY)
            .map_err(io_error("clock read"))?;
        match raw {
            None => Ok(0),
            Some(bytes) => {
                let array: [u8; VERSION_LEN] =
                    bytes.as_slice().try_into().map_err(|_| LedgerError::Corrupted {
                        message: "clock is not 8 bytes".to_string(),
                    })?;
                Ok(Version::from_be_bytes(array))
            }
        }
    }
}

impl LedgerStore for RocksDbLedger {
    fn get(&self, key: &[u8]) -> Result<Option<VersionedValue>, LedgerError> {
        self.db
            .get_cf(self.cf(CF_RECORDS)?, key)
            .map_err(io_error("get"))?
            .map(|raw| decode_entry(&raw))
            .transpose()
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanIter<'_>, LedgerError> {
        if start >= end {
            return Ok(Box::new(std::iter::empty()));
        }
        let end = end.to_vec();
        let iter = self
            .db
            .iterator_cf(self.cf(CF_RECORDS)?, IteratorMode::From(start, Direction::Forward))
            .take_while(move |item| match item {
                Ok((key, _)) => &key[..] < end.as_slice(),
                Err(_) => true,
            })
            .map(|item| {
                let (key, raw) = item.map_err(io_error("scan"))?;
                let entry = decode_entry(&raw)?;
                Ok((key.to_vec(), entry.value))
            });
        Ok(Box::new(iter))
    }

    fn commit(&self, read_set: &ReadSet, write_set: WriteSet) -> Result<(), LedgerError> {
        let _guard = self.commit_lock.lock();

        for (key, observed) in read_set.iter() {
            let current = self.get(key)?.map(|v| v.version);
            if current != observed {
                return Err(LedgerError::ReadConflict {
                    key: String::from_utf8_lossy(key).into_owned(),
                });
            }
        }
        if write_set.is_empty() {
            return Ok(());
        }

        let version = self.clock()? + 1;
        let records = self.cf(CF_RECORDS)?;
        let mut batch = WriteBatch::default();
        for op in write_set {
            match op {
                BatchOperation::Put { key, value } => {
                    batch.put_cf(records, &key, encode_entry(version, &value));
                }
                BatchOperation::Delete { key } => {
                    batch.delete_cf(records, &key);
                }
            }
        }
        batch.put_cf(self.cf(CF_METADATA)?, CLOCK_KEY, version.to_be_bytes());

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(io_error("batch write"))
    }
}

fn io_error(what: &'static str) -> impl Fn(rocksdb::Error) -> LedgerError {
    move |e| LedgerError::Io {
        message: format!("RocksDB {} failed: {}", what, e),
    }
}

fn encode_entry(version: Version, value: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(VERSION_LEN + value.len());
    raw.extend_from_slice(&version.to_be_bytes());
    raw.extend_from_slice(value);
    raw
}

fn decode_entry(raw: &[u8]) -> Result<VersionedValue, LedgerError> {
    if raw.len() < VERSION_LEN {
        return Err(LedgerError::Corrupted {
            message: format!("entry of {} bytes has no version prefix", raw.len()),
        });
    }
    let (version, value) = raw.split_at(VERSION_LEN);
    let mut array = [0u8; VERSION_LEN];
    array.copy_from_slice(version);
    Ok(VersionedValue {
        value: value.to_vec(),
        version: Version::from_be_bytes(array),
    })
}
