use crate::kv::{BASE_DELETE_KEY, BASE_EDIT_KEY, CUSTOM_KEY, KeyValueStore};
use crate::model::{Record, Source};
use crate::normalize::{coerce_string, is_truthy, normalize};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Local modification layers applied on top of the base dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    /// Full replacements for base records, keyed by base id.
    pub edits: BTreeMap<String, Record>,
    /// Base ids suppressed from the working collection.
    pub deletions: BTreeSet<String>,
    /// User-owned records in creation order.
    pub custom: Vec<Record>,
}

pub fn load_overlays(kv: &dyn KeyValueStore) -> Overlays {
    Overlays {
        edits: load_edits(kv),
        deletions: load_deletions(kv),
        custom: load_custom(kv),
    }
}

/// Read and parse a stored JSON document. Absence, read failures and bad
/// JSON all come back as `None`.
fn read_json(kv: &dyn KeyValueStore, key: &str) -> Option<Value> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "nothing stored");
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "storage read failed, using empty overlay");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored overlay is not valid JSON, using empty overlay");
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(kv: &mut dyn KeyValueStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize overlay");
            return;
        }
    };
    if let Err(e) = kv.set(key, &json) {
        warn!(key, error = %e, "failed to persist overlay");
    }
}

pub fn load_edits(kv: &dyn KeyValueStore) -> BTreeMap<String, Record> {
    let mut edits = BTreeMap::new();
    let Some(value) = read_json(kv, BASE_EDIT_KEY) else {
        return edits;
    };
    let Value::Object(entries) = value else {
        warn!(key = BASE_EDIT_KEY, "stored edits are not an object, ignoring");
        return edits;
    };
    for (id, entry) in entries {
        let mut data = match entry {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        data.insert("id".to_string(), Value::String(id.clone()));
        match normalize(&Value::Object(data), None) {
            Ok(record) => {
                edits.insert(id, record.without_source());
            }
            Err(e) => debug!(id = %id, error = %e, "dropping stored edit"),
        }
    }
    edits
}

pub fn load_deletions(kv: &dyn KeyValueStore) -> BTreeSet<String> {
    match read_json(kv, BASE_DELETE_KEY) {
        Some(Value::Array(ids)) => ids
            .iter()
            .filter(|id| is_truthy(id))
            .map(coerce_string)
            .collect(),
        Some(_) => {
            warn!(key = BASE_DELETE_KEY, "stored deletions are not an array, ignoring");
            BTreeSet::new()
        }
        None => BTreeSet::new(),
    }
}

pub fn load_custom(kv: &dyn KeyValueStore) -> Vec<Record> {
    match read_json(kv, CUSTOM_KEY) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match normalize(item, None) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "dropping stored custom record");
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!(key = CUSTOM_KEY, "stored custom records are not an array, ignoring");
            Vec::new()
        }
        None => Vec::new(),
    }
}

pub fn persist_edits(kv: &mut dyn KeyValueStore, edits: &BTreeMap<String, Record>) {
    write_json(kv, BASE_EDIT_KEY, edits);
}

pub fn persist_deletions(kv: &mut dyn KeyValueStore, deletions: &BTreeSet<String>) {
    write_json(kv, BASE_DELETE_KEY, deletions);
}

pub fn persist_custom(kv: &mut dyn KeyValueStore, custom: &[Record]) {
    write_json(kv, CUSTOM_KEY, custom);
}

impl Overlays {
    pub fn record_edit(&mut self, kv: &mut dyn KeyValueStore, id: &str, mut record: Record) {
        record.id = id.to_string();
        self.edits.insert(id.to_string(), record.without_source());
        persist_edits(kv, &self.edits);
    }

    /// Suppress a base record. Any edit for it is dropped so a later restore
    /// of the deletion does not bring the edit back.
    pub fn record_deletion(&mut self, kv: &mut dyn KeyValueStore, id: &str) {
        self.deletions.insert(id.to_string());
        self.edits.remove(id);
        persist_edits(kv, &self.edits);
        persist_deletions(kv, &self.deletions);
    }

    pub fn add_custom(&mut self, kv: &mut dyn KeyValueStore, record: Record) {
        self.custom.push(record.without_source());
        persist_custom(kv, &self.custom);
    }

    /// Returns false if no custom record has `id`; storage is rewritten
    /// either way.
    pub fn replace_custom(&mut self, kv: &mut dyn KeyValueStore, id: &str, mut record: Record) -> bool {
        let found = match self.custom.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                record.id = id.to_string();
                *slot = record.without_source();
                true
            }
            None => false,
        };
        persist_custom(kv, &self.custom);
        found
    }

    pub fn remove_custom(&mut self, kv: &mut dyn KeyValueStore, id: &str) -> bool {
        let Some(idx) = self.custom.iter().position(|r| r.id == id) else {
            return false;
        };
        self.custom.remove(idx);
        persist_custom(kv, &self.custom);
        true
    }
}

/// Combine the base dataset with the overlays into the working collection.
///
/// Base records come first in dataset order, minus deletions, each replaced
/// wholesale by its edit if one exists. Custom records follow in creation
/// order. A record whose id already appeared earlier in the output is
/// dropped, so the result never holds duplicate ids.
pub fn merge(base: &[Value], overlays: &Overlays) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(base.len() + overlays.custom.len());

    for raw in base {
        let Some(fields) = raw.as_object() else {
            continue;
        };
        let Some(id) = fields.get("id").filter(|v| is_truthy(v)).map(coerce_string) else {
            continue;
        };
        if overlays.deletions.contains(&id) {
            continue;
        }
        let mut data = match overlays.edits.get(&id) {
            Some(edit) => match edit.to_value() {
                Value::Object(fields) => fields,
                _ => fields.clone(),
            },
            None => fields.clone(),
        };
        data.insert("id".to_string(), Value::String(id.clone()));
        let Ok(record) = normalize(&Value::Object(data), Some(Source::Base)) else {
            continue;
        };
        if !seen.insert(record.id.clone()) {
            warn!(id = %record.id, "duplicate base id, keeping the first");
            continue;
        }
        merged.push(record);
    }

    for custom in &overlays.custom {
        let Ok(record) = normalize(&custom.to_value(), Some(Source::Custom)) else {
            continue;
        };
        if !seen.insert(record.id.clone()) {
            warn!(id = %record.id, "custom id collides with an earlier record, skipping");
            continue;
        }
        merged.push(record);
    }

    merged
}

/// Resolve a prefix like "cola" to a full ID. Errors if ambiguous or not found.
pub fn resolve_id(records: &[Record], prefix: &str) -> Result<String, String> {
    // Exact match first
    if records.iter().any(|r| r.id == prefix) {
        return Ok(prefix.to_string());
    }
    let matches: Vec<&str> = records
        .iter()
        .map(|r| r.id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.len() {
        0 => Err(format!("no recipe matching '{prefix}'")),
        1 => Ok(matches[0].to_string()),
        n => Err(format!(
            "ambiguous prefix '{prefix}' matches {n} recipes: {}",
            matches.join(", ")
        )),
    }
}
