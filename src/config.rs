//! Input file locations.
//!
//! Resolved from CLI flags first, then environment (a `.env` file is loaded
//! by the binary), then built-in defaults:
//!
//! | env var               | default             |
//! |-----------------------|---------------------|
//! | `NOISE_DATA_DIR`      | `data`              |
//! | `NOISE_STATIONS_FILE` | `stations.csv`      |
//! | `NOISE_READINGS_FILE` | `station_month.csv` |

use std::path::{Path, PathBuf};

use crate::loader::{READINGS_FILE, STATIONS_FILE};

pub const DATA_DIR_ENV: &str = "NOISE_DATA_DIR";
pub const STATIONS_FILE_ENV: &str = "NOISE_STATIONS_FILE";
pub const READINGS_FILE_ENV: &str = "NOISE_READINGS_FILE";

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub stations_file: PathBuf,
    pub readings_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            stations_file: PathBuf::from(STATIONS_FILE),
            readings_file: PathBuf::from(READINGS_FILE),
        }
    }
}

impl DataConfig {
    /// Defaults overridden by whichever env vars are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup(DATA_DIR_ENV).map_or(defaults.data_dir, PathBuf::from),
            stations_file: lookup(STATIONS_FILE_ENV).map_or(defaults.stations_file, PathBuf::from),
            readings_file: lookup(READINGS_FILE_ENV).map_or(defaults.readings_file, PathBuf::from),
        }
    }

    /// Applies CLI overrides on top of `self`.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        stations_file: Option<PathBuf>,
        readings_file: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(file) = stations_file {
            self.stations_file = file;
        }
        if let Some(file) = readings_file {
            self.readings_file = file;
        }
        self
    }

    /// Stations path; absolute file names bypass `data_dir`.
    pub fn stations_path(&self) -> PathBuf {
        self.resolve(&self.stations_file)
    }

    /// Readings path; absolute file names bypass `data_dir`.
    pub fn readings_path(&self) -> PathBuf {
        self.resolve(&self.readings_file)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}
