use crate::base::BaseSource;
use crate::cache::{CACHE_NAME, OfflineCache};
use crate::kv::FileStore;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_DATA_DIR: &str = ".sodabar";
pub const DATA_DIR_ENV: &str = "SODABAR_DIR";
pub const BASE_ENV: &str = "SODABAR_BASE";
pub const LOG_ENV: &str = "SODABAR_LOG";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub base: BaseSource,
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            base: BaseSource::Embedded,
            verbosity: 0,
        }
    }
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>, base: Option<BaseSource>, verbosity: u8) -> Self {
        let defaults = Config::default();
        Config {
            data_dir: data_dir.unwrap_or(defaults.data_dir),
            base: base.unwrap_or(defaults.base),
            verbosity,
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn storage(&self) -> FileStore {
        FileStore::open(&self.data_dir)
    }

    /// Open the offline cache and retire every other generation.
    pub fn cache(&self) -> OfflineCache {
        let cache = OfflineCache::new(self.cache_dir(), CACHE_NAME);
        match cache.activate() {
            Ok(stale) if !stale.is_empty() => debug!(removed = ?stale, "stale caches removed"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "unable to remove stale caches"),
        }
        cache
    }
}
