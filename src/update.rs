use crate::cache::{CacheError, OfflineCache};
use crate::kv::{BASE_DELETE_KEY, BASE_EDIT_KEY, KeyValueStore};
use thiserror::Error;
use tracing::{info, warn};

pub const UPDATE_LABEL: &str = "Update Soda Bar";
pub const UPDATING_LABEL: &str = "Updating…";

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("an update is already in progress")]
    Busy,
    #[error("Unable to update right now: {0}")]
    Cache(#[from] CacheError),
}

/// Restore the built-in recipes and drop cached assets. Custom recipes are
/// kept. The caller reloads the catalog afterwards.
pub fn update_app(kv: &mut dyn KeyValueStore, cache: &OfflineCache) -> Result<(), UpdateError> {
    for key in [BASE_EDIT_KEY, BASE_DELETE_KEY] {
        if let Err(e) = kv.remove(key) {
            warn!(key, error = %e, "unable to clear stored base recipes");
        }
    }
    let cleared = cache.clear()?;
    info!(cleared, "cache cleared");
    Ok(())
}

/// Trigger state for the update action: disabled while running, restored to
/// its previous label when the attempt fails.
#[derive(Debug, Clone)]
pub struct UpdateControl {
    label: String,
    busy: bool,
}

impl Default for UpdateControl {
    fn default() -> Self {
        UpdateControl {
            label: UPDATE_LABEL.to_string(),
            busy: false,
        }
    }
}

impl UpdateControl {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Run `action` unless an attempt is already in flight. On success the
    /// control stays busy until the caller reloads; on failure it is reset.
    pub fn trigger<F>(&mut self, action: F) -> Result<(), UpdateError>
    where
        F: FnOnce() -> Result<(), UpdateError>,
    {
        if self.busy {
            return Err(UpdateError::Busy);
        }
        let original = std::mem::replace(&mut self.label, UPDATING_LABEL.to_string());
        self.busy = true;
        let result = action();
        if result.is_err() {
            self.label = original;
            self.busy = false;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_NAME;
    use crate::kv::{CUSTOM_KEY, MemoryStore, THEME_KEY};
    use reqwest::Url;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn clears_base_overlays_and_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = OfflineCache::new(tmp.path().join("cache"), CACHE_NAME);
        cache
            .put(&Url::parse("https://soda.example/recipes.json").unwrap(), b"[]")
            .unwrap();
        let mut kv = MemoryStore::new();
        kv.set(BASE_EDIT_KEY, "{}").unwrap();
        kv.set(BASE_DELETE_KEY, "[\"a\"]").unwrap();
        kv.set(CUSTOM_KEY, "[]").unwrap();
        kv.set(THEME_KEY, "dark").unwrap();

        update_app(&mut kv, &cache).unwrap();
        assert_eq!(kv.get(BASE_EDIT_KEY).unwrap(), None);
        assert_eq!(kv.get(BASE_DELETE_KEY).unwrap(), None);
        assert_eq!(kv.get(CUSTOM_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert!(cache.generations().unwrap().is_empty());
    }

    #[test]
    fn cache_failure_is_surfaced() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        fs::write(&root, "not a directory").unwrap();
        let cache = OfflineCache::new(&root, CACHE_NAME);
        let err = update_app(&mut MemoryStore::new(), &cache).unwrap_err();
        assert!(matches!(err, UpdateError::Cache(_)), "{err}");
    }

    #[test]
    fn control_restores_after_failure() {
        let mut control = UpdateControl::default();
        let err = control
            .trigger(|| Err(UpdateError::Cache(CacheError::Io(std::io::Error::other("boom")))))
            .unwrap_err();
        assert!(matches!(err, UpdateError::Cache(_)));
        assert!(!control.is_busy());
        assert_eq!(control.label(), UPDATE_LABEL);
    }

    #[test]
    fn control_rejects_second_trigger_while_busy() {
        let mut control = UpdateControl::default();
        control.trigger(|| Ok(())).unwrap();
        assert!(control.is_busy());
        assert_eq!(control.label(), UPDATING_LABEL);
        assert!(matches!(control.trigger(|| Ok(())), Err(UpdateError::Busy)));
    }
}
