//! Local cache for daily records
//!
//! The cache always holds one complete snapshot: the records of the most
//! recent successful sync, or nothing before the first one. Writing replaces
//! the whole snapshot at once; readers never see a mix of old and new records.
//!
//! ## Backends
//!
//! - **SQLite** (`SqliteCache`): durable, delete + insert inside one transaction
//! - **Memory** (`MemoryCache`): process-local, whole-vector swap under a lock
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/hotsauce/
//! └── cache.db                     # SQLite snapshot of daily records
//! ```

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::DailyRecord;

/// Get the default storage path
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotsauce")
}

/// Get the default cache database path
pub fn default_cache_path() -> PathBuf {
    default_storage_path().join("cache.db")
}

/// Durable storage primitives for the record snapshot
pub trait CacheBackend: Send + Sync {
    /// Delete every stored record and insert `records`, atomically
    fn replace_all(&self, records: &[DailyRecord]) -> Result<()>;

    /// Every stored record, newest date first
    fn fetch_all(&self) -> Result<Vec<DailyRecord>>;
}

/// Handle to the record cache, shared by whoever needs it
#[derive(Clone)]
pub struct LocalCache {
    backend: Arc<dyn CacheBackend>,
}

impl LocalCache {
    /// Open a SQLite cache at `path`, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::with_backend(Arc::new(SqliteCache::open(path)?)))
    }

    /// Open the SQLite cache at the default location
    pub fn open_default() -> Result<Self> {
        Self::open(default_cache_path())
    }

    /// Cache that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryCache::new()))
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Replace the stored snapshot with `records`
    ///
    /// Records sharing a date collapse to the last one given. On failure the
    /// previous snapshot stays in place and the error is returned for the
    /// caller to report.
    pub fn replace_all(&self, records: &[DailyRecord]) -> Result<()> {
        let snapshot = normalize(records);

        match self.backend.replace_all(&snapshot) {
            Ok(()) => {
                debug!(records = snapshot.len(), "Replaced cached records");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to replace cached records, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Cached records newest first, empty if the cache cannot be read
    pub fn fetch_all(&self) -> Vec<DailyRecord> {
        match self.backend.fetch_all() {
            Ok(mut records) => {
                records.sort_by(|a, b| b.date().cmp(&a.date()));
                records
            }
            Err(e) => {
                warn!(error = %e, "Failed to read cached records");
                Vec::new()
            }
        }
    }
}

/// One record per date, newest first
fn normalize(records: &[DailyRecord]) -> Vec<DailyRecord> {
    let by_date: BTreeMap<NaiveDate, &DailyRecord> =
        records.iter().map(|r| (r.date(), r)).collect();
    by_date.into_values().rev().cloned().collect()
}
