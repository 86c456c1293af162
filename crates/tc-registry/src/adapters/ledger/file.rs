use crate::adapters::ledger::LedgerState;
use crate::domain::errors::LedgerError;
use crate::ports::outbound::{LedgerStore, ReadSet, ScanIter, VersionedValue, WriteSet};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"TCL1";

/// File-backed ledger for local operation without RocksDB.
///
/// The whole key space is rewritten on every commit through a temp file and
/// an atomic rename, so a crash leaves either the old or the new ledger.
/// An exclusive `fs2` lock on `<path>.lock` keeps a second process out for
/// as long as the ledger is open.
///
/// Binary format:
/// `[magic:4][clock:u64]` then `[key_len:u32][key][version:u64][value_len:u32][value]...`
#[derive(Debug)]
pub struct FileBackedLedger {
    state: RwLock<LedgerState>,
    path: PathBuf,
    lock_file: File,
}

impl FileBackedLedger {
    /// Open (or create) the ledger stored at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error)?;
        lock_file.try_lock_exclusive().map_err(|_| LedgerError::Io {
            message: format!("ledger already in use ({})", lock_path.display()),
        })?;

        let state = if path.exists() {
            let state = Self::load_from_file(&path)?;
            tracing::info!(
                "[tc-registry] loaded {} keys from {}",
                state.entries.len(),
                path.display()
            );
            state
        } else {
            tracing::info!("[tc-registry] no ledger file at {}, starting empty", path.display());
            LedgerState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            path,
            lock_file,
        })
    }

    /// Location of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<LedgerState, LedgerError> {
        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(io_error)?;
        if bytes.is_empty() {
            return Ok(LedgerState::default());
        }

        let mut cursor = Cursor::new(&bytes);
        if cursor.take(MAGIC.len())? != MAGIC {
            return Err(corrupted("bad magic"));
        }
        let clock = cursor.u64()?;

        let mut entries = BTreeMap::new();
        while !cursor.at_end() {
            let key_len = cursor.u32()? as usize;
            let key = cursor.take(key_len)?.to_vec();
            let version = cursor.u64()?;
            let value_len = cursor.u32()? as usize;
            let value = cursor.take(value_len)?.to_vec();
            if version > clock {
                return Err(corrupted("record version ahead of ledger clock"));
            }
            entries.insert(key, VersionedValue { value, version });
        }

        Ok(LedgerState { entries, clock })
    }

    fn save_to_file(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&state.clock.to_le_bytes());
        for (key, entry) in &state.entries {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&entry.version.to_le_bytes());
            bytes.extend_from_slice(&(entry.value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&entry.value);
        }

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;
        Ok(())
    }
}

impl LedgerStore for FileBackedLedger {
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
        if write_set.is_empty() {
            return Ok(());
        }
        // Persist first; memory only moves forward once the file did.
        let mut next = state.clone();
        next.apply(write_set);
        self.save_to_file(&next)?;
        *state = next;
        Ok(())
    }
}

impl Drop for FileBackedLedger {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], LedgerError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| corrupted("truncated ledger file"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, LedgerError> {
        let raw = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64, LedgerError> {
        let raw = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_le_bytes(buf))
    }
}

fn io_error(e: std::io::Error) -> LedgerError {
    LedgerError::Io {
        message: e.to_string(),
    }
}

fn corrupted(message: &str) -> LedgerError {
    LedgerError::Corrupted {
        message: message.to_string(),
    }
}
