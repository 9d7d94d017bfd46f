//! Create/edit form for a single recipe.
//!
//! The controller is either closed, creating a new custom record, or editing
//! an existing record (base or custom). Submitting validates the fields,
//! writes the result into the catalog's overlays and closes the form.

use crate::catalog::Catalog;
use crate::kv::KeyValueStore;
use crate::model::{AdultVariant, Record, Source};
use thiserror::Error;
use tracing::{debug, warn};

pub const ING_PLACEHOLDER: &str = "e.g. 12 oz Diet Coke";
pub const METHOD_PLACEHOLDER: &str = "e.g. Pour over pebble ice";
pub const ING_EXTRA_PLACEHOLDER: &str = "e.g. 1 Tbsp coconut syrup";
pub const METHOD_EXTRA_PLACEHOLDER: &str = "e.g. Stir gently to combine";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Closed,
    Create,
    Edit { id: String, source: Source },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Tags,
    Ingredients,
    Method,
    Notes,
    Spiced,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing name")]
    MissingName,
    #[error("please add at least one ingredient")]
    MissingIngredients,
    #[error("please add at least one method step")]
    MissingMethod,
}

impl ValidationError {
    /// The field that receives focus after the failure.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::MissingName => Field::Name,
            ValidationError::MissingIngredients => Field::Ingredients,
            ValidationError::MissingMethod => Field::Method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no recipe form is open")]
    NotOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub value: String,
    pub placeholder: &'static str,
}

/// A growable list of independent text rows.
#[derive(Debug, Clone)]
pub struct ListEditor {
    rows: Vec<Row>,
    placeholder: &'static str,
    extra_placeholder: &'static str,
}

impl ListEditor {
    fn new(placeholder: &'static str, extra_placeholder: &'static str) -> Self {
        let mut editor = ListEditor {
            rows: Vec::new(),
            placeholder,
            extra_placeholder,
        };
        editor.seed();
        editor
    }

    /// Reset to a single empty row.
    pub fn seed(&mut self) {
        self.populate::<&str>(&[]);
    }

    /// One row per value, or a single empty row when there are none.
    pub fn populate<T: AsRef<str>>(&mut self, values: &[T]) {
        self.rows = values
            .iter()
            .map(|v| Row {
                value: v.as_ref().to_string(),
                placeholder: self.placeholder,
            })
            .collect();
        if self.rows.is_empty() {
            self.rows.push(Row {
                value: String::new(),
                placeholder: self.placeholder,
            });
        }
    }

    /// Append an empty row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(Row {
            value: String::new(),
            placeholder: self.extra_placeholder,
        });
        self.rows.len() - 1
    }

    pub fn set(&mut self, idx: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(idx) {
            Some(row) => {
                row.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Trimmed row values with empty rows dropped.
    pub fn values(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.value.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FormFields {
    pub name: String,
    /// Comma-separated.
    pub tags: String,
    pub ingredients: ListEditor,
    pub method: ListEditor,
    pub notes: String,
    /// Comma-separated extras for the adult variant.
    pub spiced: String,
}

impl Default for FormFields {
    fn default() -> Self {
        FormFields {
            name: String::new(),
            tags: String::new(),
            ingredients: ListEditor::new(ING_PLACEHOLDER, ING_EXTRA_PLACEHOLDER),
            method: ListEditor::new(METHOD_PLACEHOLDER, METHOD_EXTRA_PLACEHOLDER),
            notes: String::new(),
            spiced: String::new(),
        }
    }
}

impl FormFields {
    fn from_record(record: &Record) -> Self {
        let mut fields = FormFields {
            name: record.name.clone(),
            tags: record.tags.join(", "),
            notes: record.notes.clone(),
            spiced: record
                .adult_variant
                .as_ref()
                .map(|av| av.extra.join(", "))
                .unwrap_or_default(),
            ..FormFields::default()
        };
        fields.ingredients.populate(&record.ingredients);
        fields.method.populate(&record.method);
        fields
    }
}

fn split_commas(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct FormController {
    state: FormState,
    pub fields: FormFields,
    snapshot: Option<Record>,
    focus: Option<Field>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        FormController {
            state: FormState::Closed,
            fields: FormFields::default(),
            snapshot: None,
            focus: None,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != FormState::Closed
    }

    pub fn focus(&self) -> Option<Field> {
        self.focus
    }

    pub fn title(&self) -> &'static str {
        match self.state {
            FormState::Edit { .. } => "Edit Recipe",
            _ => "Save Custom Recipe",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.state {
            FormState::Edit { .. } => "Update recipe",
            _ => "Save recipe",
        }
    }

    pub fn open_create(&mut self) {
        self.state = FormState::Create;
        self.fields = FormFields::default();
        self.snapshot = None;
        self.focus = Some(Field::Name);
    }

    pub fn open_edit(&mut self, record: &Record) {
        self.state = FormState::Edit {
            id: record.id.clone(),
            source: record.source.unwrap_or(Source::Custom),
        };
        self.fields = FormFields::from_record(record);
        self.snapshot = Some(record.clone());
        self.focus = Some(Field::Name);
    }

    /// Close without writing anything.
    pub fn cancel(&mut self) {
        self.state = FormState::Closed;
        self.fields = FormFields::default();
        self.snapshot = None;
        self.focus = None;
    }

    /// Validate the fields and build the record they describe. For a new
    /// record the id is left empty; the catalog assigns one.
    pub fn candidate(&self) -> Result<Record, ValidationError> {
        let name = self.fields.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let ingredients = self.fields.ingredients.values();
        if ingredients.is_empty() {
            return Err(ValidationError::MissingIngredients);
        }
        let method = self.fields.method.values();
        if method.is_empty() {
            return Err(ValidationError::MissingMethod);
        }

        let id = match &self.state {
            FormState::Edit { id, .. } => id.clone(),
            _ => String::new(),
        };
        let extras = split_commas(&self.fields.spiced);
        let adult_variant = (!extras.is_empty()).then(|| AdultVariant {
            name: format!("{name} — Spiced"),
            extra: extras,
            note: self
                .snapshot
                .as_ref()
                .and_then(|s| s.adult_variant.as_ref())
                .map(|av| av.note.clone())
                .unwrap_or_default(),
        });

        Ok(Record {
            id,
            tags: split_commas(&self.fields.tags),
            ingredients,
            method,
            notes: self.fields.notes.trim().to_string(),
            adult_variant,
            source: None,
            name,
        })
    }

    /// Validate and write the form into `catalog`. On success the form
    /// closes and the id of the written record is returned. On a validation
    /// failure nothing is written, the form stays open and focus moves to
    /// the offending field.
    pub fn submit<S: KeyValueStore>(&mut self, catalog: &mut Catalog<S>) -> Result<String, FormError> {
        if !self.is_open() {
            return Err(FormError::NotOpen);
        }
        let record = match self.candidate() {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "form rejected");
                self.focus = Some(e.field());
                return Err(e.into());
            }
        };

        let id = match &self.state {
            FormState::Edit { id, source: Source::Base } => {
                catalog.record_edit(id, record);
                id.clone()
            }
            FormState::Edit { id, source: Source::Custom } => {
                if !catalog.replace_custom(id, record) {
                    warn!(id = %id, "edited custom recipe no longer exists");
                }
                id.clone()
            }
            FormState::Create => catalog.add_custom(record),
            FormState::Closed => return Err(FormError::NotOpen),
        };
        self.cancel();
        Ok(id)
    }
}
