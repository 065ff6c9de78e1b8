//! Process-wide cache of joined datasets.
//!
//! One entry per canonical path pair. Each entry remembers the identity of
//! both files (size, modification time) it was loaded from: an unchanged
//! pair is joined only once, and an edited pair replaces its entry. Cached
//! datasets are never mutated; failed loads are not cached.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::loader::{Dataset, load_dataset};

type Entries = HashMap<(PathBuf, PathBuf), CacheEntry>;

struct CacheEntry {
    key: SourceKey,
    dataset: Arc<Dataset>,
}

static CACHE: OnceLock<Mutex<Entries>> = OnceLock::new();

/// Identity of one input file at the time it was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    /// # Errors
    ///
    /// Returns [`DashboardError::DataUnavailable`] if the file's metadata
    /// cannot be read.
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| {
            DashboardError::data_unavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        Ok(Self {
            path: fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Cache key: the identities of the stations and readings files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub stations: FileIdentity,
    pub readings: FileIdentity,
}

impl SourceKey {
    fn paths(&self) -> (PathBuf, PathBuf) {
        (self.stations.path.clone(), self.readings.path.clone())
    }

    /// # Errors
    ///
    /// Returns [`DashboardError::DataUnavailable`] if either file is missing.
    pub fn new(stations: &Path, readings: &Path) -> Result<Self> {
        Ok(Self {
            stations: FileIdentity::of(stations)?,
            readings: FileIdentity::of(readings)?,
        })
    }
}

fn entries() -> MutexGuard<'static, Entries> {
    CACHE
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Returns the joined dataset for the two files, loading it on first use.
///
/// # Errors
///
/// Propagates [`DashboardError::DataUnavailable`] from the loader.
pub fn load_cached(stations: &Path, readings: &Path) -> Result<Arc<Dataset>> {
    let key = SourceKey::new(stations, readings)?;
    let paths = key.paths();

    if let Some(hit) = entries().get(&paths).filter(|entry| entry.key == key) {
        debug!(stations = %key.stations.path.display(), "Dataset cache hit");
        return Ok(Arc::clone(&hit.dataset));
    }

    let dataset = Arc::new(load_dataset(stations, readings)?);

    let mut cache = entries();
    let stale = cache.insert(
        paths,
        CacheEntry {
            key,
            dataset: Arc::clone(&dataset),
        },
    );
    info!(
        cached = cache.len(),
        replaced = stale.is_some(),
        "Dataset cached"
    );
    Ok(dataset)
}
