//! Parse-and-validate boundary for untrusted record JSON.
//!
//! Everything that reaches the working collection passes through
//! [`normalize`]: stored overlays, the base dataset and form submissions.
//! Sequences are always present afterwards, strings are always strings and
//! `adult_variant` is either a full sub-record or absent.

use crate::model::{AdultVariant, Record, Source};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no id")]
    MissingId,
}

pub fn normalize(raw: &Value, source: Option<Source>) -> Result<Record, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;
    let id = match obj.get("id") {
        Some(v) if is_truthy(v) => coerce_string(v),
        _ => return Err(NormalizeError::MissingId),
    };

    Ok(Record {
        id,
        name: strict_string(obj.get("name")),
        tags: string_seq(obj.get("tags")),
        ingredients: string_seq(obj.get("ingredients")),
        method: string_seq(obj.get("method")),
        notes: loose_string(obj.get("notes")),
        adult_variant: match obj.get("adult_variant") {
            Some(Value::Object(fields)) => Some(adult_variant(fields)),
            // Arrays are object-like to the host page and carry no fields.
            Some(Value::Array(_)) => Some(adult_variant(&Map::new())),
            _ => None,
        },
        source,
    })
}

fn adult_variant(obj: &Map<String, Value>) -> AdultVariant {
    AdultVariant {
        name: strict_string(obj.get("name")),
        extra: string_seq(obj.get("extra")),
        note: loose_string(obj.get("note")),
    }
}

/// Strings pass through, anything else becomes empty.
fn strict_string(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Strings pass through, other truthy values are stringified, falsy values
/// become empty.
fn loose_string(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(other) if is_truthy(other) => coerce_string(other),
        _ => String::new(),
    }
}

fn string_seq(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items.iter().map(coerce_string).collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Stringify a JSON value the way a loosely typed host page would display
/// it: integral floats lose their fraction, arrays join with commas and
/// `null` elements inside arrays render empty.
pub(crate) fn coerce_string(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
