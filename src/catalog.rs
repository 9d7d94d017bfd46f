use crate::id::generate_id;
use crate::kv::KeyValueStore;
use crate::model::{Record, Source};
use crate::normalize::{coerce_string, is_truthy};
use crate::store::{self, Overlays};
use crate::view::{self, CardAction, Grid};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

pub const DELETE_BASE_PROMPT: &str =
    "Delete this built-in recipe? Run `sodabar update` later to restore the defaults.";
pub const DELETE_CUSTOM_PROMPT: &str = "Delete this custom recipe?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0}")]
    Lookup(String),
    #[error("recipe '{0}' not found")]
    NotFound(String),
}

/// Application state: the immutable base dataset, the overlays, the merged
/// working collection and the view flags. The collection is recomputed from
/// scratch after every overlay mutation.
pub struct Catalog<S: KeyValueStore> {
    storage: S,
    base: Vec<Value>,
    overlays: Overlays,
    records: Vec<Record>,
    pub query: String,
    pub show_adult: bool,
}

impl<S: KeyValueStore> Catalog<S> {
    pub fn open(storage: S, base: Vec<Value>) -> Self {
        let overlays = store::load_overlays(&storage);
        let records = store::merge(&base, &overlays);
        info!(
            base = base.len(),
            edits = overlays.edits.len(),
            deleted = overlays.deletions.len(),
            custom = overlays.custom.len(),
            "catalog loaded"
        );
        Catalog {
            storage,
            base,
            overlays,
            records,
            query: String::new(),
            show_adult: false,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn resolve(&self, prefix: &str) -> Result<&Record, CatalogError> {
        let id = store::resolve_id(&self.records, prefix).map_err(CatalogError::Lookup)?;
        self.get(&id).ok_or(CatalogError::NotFound(id))
    }

    pub fn visible(&self) -> Vec<&Record> {
        view::visible(&self.records, &self.query, self.show_adult)
    }

    pub fn grid(&self, actions: &[CardAction]) -> Grid {
        view::render(&self.records, &self.query, self.show_adult, actions)
    }

    /// Re-read overlays from storage and rebuild, as after a page reload.
    pub fn reload(&mut self) {
        self.overlays = store::load_overlays(&self.storage);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.records = store::merge(&self.base, &self.overlays);
    }

    /// Every id a new custom record must avoid: the whole base dataset
    /// (deleted entries come back on update) plus all overlay ids.
    fn taken_ids(&self) -> HashSet<String> {
        let base_ids = self.base.iter().filter_map(|raw| {
            raw.get("id")
                .filter(|v| is_truthy(v))
                .map(coerce_string)
        });
        base_ids
            .chain(self.records.iter().map(|r| r.id.clone()))
            .chain(self.overlays.custom.iter().map(|r| r.id.clone()))
            .chain(self.overlays.edits.keys().cloned())
            .chain(self.overlays.deletions.iter().cloned())
            .collect()
    }

    pub fn record_edit(&mut self, id: &str, record: Record) {
        self.overlays.record_edit(&mut self.storage, id, record);
        self.rebuild();
    }

    pub fn replace_custom(&mut self, id: &str, record: Record) -> bool {
        let found = self.overlays.replace_custom(&mut self.storage, id, record);
        self.rebuild();
        found
    }

    /// Store `record` as a new custom entry under a freshly generated id.
    pub fn add_custom(&mut self, mut record: Record) -> String {
        let taken = self.taken_ids();
        let taken: Vec<&str> = taken.iter().map(String::as_str).collect();
        let id = generate_id(&taken);
        record.id = id.clone();
        self.overlays.add_custom(&mut self.storage, record);
        self.rebuild();
        info!(id = %id, "custom recipe added");
        id
    }

    /// Delete a record after `confirm` accepts the prompt for its source.
    /// Base records are suppressed; custom records are removed. Returns
    /// whether anything was deleted.
    pub fn delete(&mut self, id: &str, confirm: impl FnOnce(&str) -> bool) -> Result<bool, CatalogError> {
        let record = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let source = record.source.unwrap_or(Source::Custom);
        if !confirm(delete_prompt(source)) {
            return Ok(false);
        }
        match source {
            Source::Base => self.overlays.record_deletion(&mut self.storage, id),
            Source::Custom => {
                self.overlays.remove_custom(&mut self.storage, id);
            }
        }
        self.rebuild();
        info!(id, %source, "recipe deleted");
        Ok(true)
    }
}

pub fn delete_prompt(source: Source) -> &'static str {
    match source {
        Source::Base => DELETE_BASE_PROMPT,
        Source::Custom => DELETE_CUSTOM_PROMPT,
    }
}
