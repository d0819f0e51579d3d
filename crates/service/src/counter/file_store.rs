use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, error, warn};

use crate::counter::record::{ClickDelta, CounterRecord};
use crate::counter::store::CounterStore;
use crate::errors::ServiceError;
use crate::observability::{COUNTER_RESETS_TOTAL, INCREMENTS_TOTAL, SAVE_FAILURES_TOTAL};

/// Counter persisted as one pretty-printed JSON file guarded by advisory locks.
///
/// Every call goes back to disk; nothing is cached between calls. Reads take a
/// shared lock and writes an exclusive one, each released when the handle drops.
/// A file that is empty or does not hold a valid record is reset to zero.
///
/// With `serialize_increments` (the default) an increment keeps the exclusive
/// lock from its read through its write, so concurrent increments from any
/// process are never lost. Without it the load and the save are locked
/// separately and two overlapping increments can overwrite each other.
#[derive(Clone, Debug)]
pub struct FileCounterStore {
    path: PathBuf,
    serialize_increments: bool,
}

impl FileCounterStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), serialize_increments: true }
    }

    pub fn with_serialized_increments(mut self, on: bool) -> Self {
        self.serialize_increments = on;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> ServiceError {
        ServiceError::io(&self.path, source)
    }

    fn ensure_parent(&self) -> Result<(), ServiceError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| ServiceError::io(parent, e))
            }
            _ => Ok(()),
        }
    }

    /// Open for writing without truncating; truncation happens under the lock.
    fn open_rw(&self) -> Result<File, ServiceError> {
        self.ensure_parent()?;
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.io_err(e))
    }

    fn write_record(&self, record: &CounterRecord) -> Result<(), ServiceError> {
        let mut file = self.open_rw()?;
        FileExt::lock_exclusive(&file).map_err(|e| self.io_err(e))?;
        let res = self.write_locked(&mut file, record);
        let _ = FileExt::unlock(&file);
        res
    }

    fn write_locked(&self, file: &mut File, record: &CounterRecord) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(record)?;
        file.set_len(0).map_err(|e| self.io_err(e))?;
        file.seek(SeekFrom::Start(0)).map_err(|e| self.io_err(e))?;
        file.write_all(&data).map_err(|e| self.io_err(e))?;
        file.flush().map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Reset the file to a zero record, re-reading it under the exclusive lock
    /// first: a writer that got in since the caller's read wins.
    fn reinitialize(&self) -> Result<CounterRecord, ServiceError> {
        let mut file = self.open_rw()?;
        FileExt::lock_exclusive(&file).map_err(|e| self.io_err(e))?;
        let res = self.reinitialize_locked(&mut file);
        let _ = FileExt::unlock(&file);
        res
    }

    fn reinitialize_locked(&self, file: &mut File) -> Result<CounterRecord, ServiceError> {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| self.io_err(e))?;
        if let Ok(record) = serde_json::from_slice::<CounterRecord>(&bytes) {
            debug!(path = %self.path.display(), "clicks file rewritten concurrently; keeping it");
            return Ok(record);
        }
        let record = CounterRecord::zero();
        self.write_locked(file, &record)?;
        Ok(record)
    }

    /// Decode file contents; `None` means the contents must be reset.
    fn decode(&self, bytes: &[u8]) -> Option<CounterRecord> {
        if bytes.is_empty() {
            debug!(path = %self.path.display(), "clicks file empty; initializing");
            return None;
        }
        match serde_json::from_slice::<CounterRecord>(bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "clicks file corrupt; resetting counter to zero");
                COUNTER_RESETS_TOTAL.inc();
                None
            }
        }
    }

    fn increment_serialized(&self, delta: ClickDelta) -> Result<CounterRecord, ServiceError> {
        let mut file = self.open_rw()?;
        FileExt::lock_exclusive(&file).map_err(|e| self.io_err(e))?;
        let res = self.increment_locked(&mut file, delta);
        let _ = FileExt::unlock(&file);
        res
    }

    fn increment_locked(&self, file: &mut File, delta: ClickDelta) -> Result<CounterRecord, ServiceError> {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| self.io_err(e))?;
        let mut record = self.decode(&bytes).unwrap_or_else(CounterRecord::zero);
        record.bump(delta);
        if let Err(e) = self.write_locked(file, &record) {
            error!(path = %self.path.display(), error = %e, "error saving clicks");
            SAVE_FAILURES_TOTAL.inc();
            return Err(ServiceError::SaveFailed);
        }
        Ok(record)
    }

    fn increment_unserialized(&self, delta: ClickDelta) -> Result<CounterRecord, ServiceError> {
        let mut record = self.load()?;
        record.bump(delta);
        if !self.save(&record) {
            return Err(ServiceError::SaveFailed);
        }
        Ok(record)
    }
}

impl CounterStore for FileCounterStore {
    fn load(&self) -> Result<CounterRecord, ServiceError> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "clicks file missing; initializing");
                return self.reinitialize();
            }
            Err(e) => return Err(self.io_err(e)),
        };

        FileExt::lock_shared(&file).map_err(|e| self.io_err(e))?;
        let mut bytes = Vec::new();
        let read = file.read_to_end(&mut bytes);
        let _ = FileExt::unlock(&file);
        drop(file);

        match read {
            Ok(_) => {}
            // Removed between open and read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.reinitialize(),
            Err(e) => return Err(self.io_err(e)),
        }

        match self.decode(&bytes) {
            Some(record) => Ok(record),
            None => self.reinitialize(),
        }
    }

    fn save(&self, record: &CounterRecord) -> bool {
        match self.write_record(record) {
            Ok(()) => {
                debug!(path = %self.path.display(), total_clicks = record.total_clicks, "clicks saved");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "error saving clicks");
                SAVE_FAILURES_TOTAL.inc();
                false
            }
        }
    }

    fn increment(&self, delta: ClickDelta) -> Result<CounterRecord, ServiceError> {
        let record = if self.serialize_increments {
            self.increment_serialized(delta)?
        } else {
            self.increment_unserialized(delta)?
        };
        INCREMENTS_TOTAL.inc();
        debug!(delta = delta.get(), total_clicks = record.total_clicks, "clicks incremented");
        Ok(record)
    }
}
