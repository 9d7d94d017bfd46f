use crate::model::Record;
use crate::view::render_card;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_TITLE: &str = "Soda Bar Recipe";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Sharing is not supported on this device.")]
    Unsupported,
    #[error("Sharing failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub file_name: String,
    pub body: Vec<u8>,
}

/// A platform share capability. Absent when the platform has none.
pub trait ShareTarget {
    fn can_share(&self, payload: &SharePayload) -> bool;
    fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Lowercase, collapse everything outside `[a-z0-9]` into single dashes,
/// trim dashes, fall back to `recipe`.
pub fn safe_name(name: &str) -> String {
    let lowered = if name.is_empty() { "recipe".to_string() } else { name.to_lowercase() };
    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "recipe".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the export for a record: the rendered card without its actions.
pub fn payload(record: &Record, show_adult: bool) -> SharePayload {
    let card = render_card(record, show_adult, &[]);
    let title = if record.name.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        record.name.clone()
    };
    let text = if record.notes.is_empty() {
        record.name.clone()
    } else {
        format!("{}\n{}", record.name, record.notes)
    };
    SharePayload {
        title,
        text,
        file_name: format!("{}.txt", safe_name(&record.name)),
        body: card.to_string().into_bytes(),
    }
}

pub fn share_record(record: &Record, show_adult: bool, target: Option<&dyn ShareTarget>) -> Result<(), ShareError> {
    let Some(target) = target else {
        return Err(ShareError::Unsupported);
    };
    let payload = payload(record, show_adult);
    if !target.can_share(&payload) {
        return Err(ShareError::Unsupported);
    }
    target.share(&payload).inspect_err(|e| {
        error!(id = %record.id, error = %e, "share failed");
    })?;
    info!(id = %record.id, file = %payload.file_name, "recipe shared");
    Ok(())
}

/// Writes the shared file into a directory.
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryShare { dir: dir.into() }
    }

    pub fn path_for(&self, payload: &SharePayload) -> PathBuf {
        self.dir.join(&payload.file_name)
    }
}

impl ShareTarget for DirectoryShare {
    fn can_share(&self, _payload: &SharePayload) -> bool {
        !self.dir.is_file()
    }

    fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        fs::create_dir_all(&self.dir).map_err(|e| ShareError::Failed(e.to_string()))?;
        fs::write(self.path_for(payload), &payload.body).map_err(|e| ShareError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdultVariant;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct Recorder {
        allowed: bool,
        shared: RefCell<Vec<SharePayload>>,
    }

    impl ShareTarget for Recorder {
        fn can_share(&self, _payload: &SharePayload) -> bool {
            self.allowed
        }
        fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
            self.shared.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    fn float() -> Record {
        let mut r = Record::new("cola-float", "Cola Float!");
        r.ingredients = vec!["cola".to_string()];
        r.method = vec!["pour".to_string()];
        r.notes = "Serve cold".to_string();
        r.adult_variant = Some(AdultVariant {
            name: "Boozy".to_string(),
            extra: vec!["rum".to_string()],
            note: String::new(),
        });
        r
    }

    #[test]
    fn safe_name_slugifies() {
        assert_eq!(safe_name("Cola Float!"), "cola-float");
        assert_eq!(safe_name("  Dr. Pepper & Cream  "), "dr-pepper-cream");
        assert_eq!(safe_name("!!!"), "recipe");
        assert_eq!(safe_name(""), "recipe");
        assert_eq!(safe_name("Crème Brûlée"), "cr-me-br-l-e");
    }

    #[test]
    fn payload_fields() {
        let p = payload(&float(), false);
        assert_eq!(p.title, "Cola Float!");
        assert_eq!(p.text, "Cola Float!\nServe cold");
        assert_eq!(p.file_name, "cola-float.txt");
        let body = String::from_utf8(p.body).unwrap();
        assert!(!body.contains("[Edit]"), "{body}");
        assert!(!body.contains("Adult Variant"), "{body}");
    }

    #[test]
    fn payload_for_unnamed_record() {
        let p = payload(&Record::new("x", ""), true);
        assert_eq!(p.title, DEFAULT_TITLE);
        assert_eq!(p.text, "");
        assert_eq!(p.file_name, "recipe.txt");
    }

    #[test]
    fn missing_capability_is_unsupported() {
        let err = share_record(&float(), false, None).unwrap_err();
        assert!(matches!(err, ShareError::Unsupported));
        assert_eq!(err.to_string(), "Sharing is not supported on this device.");
    }

    #[test]
    fn refusing_capability_is_unsupported() {
        let target = Recorder {
            allowed: false,
            shared: RefCell::new(Vec::new()),
        };
        assert!(matches!(share_record(&float(), false, Some(&target)), Err(ShareError::Unsupported)));
        assert!(target.shared.borrow().is_empty());
    }

    #[test]
    fn shares_through_capability() {
        let target = Recorder {
            allowed: true,
            shared: RefCell::new(Vec::new()),
        };
        share_record(&float(), true, Some(&target)).unwrap();
        let shared = target.shared.borrow();
        assert_eq!(shared.len(), 1);
        assert!(String::from_utf8_lossy(&shared[0].body).contains("Adult Variant"));
    }

    #[test]
    fn directory_share_writes_file() {
        let tmp = TempDir::new().unwrap();
        let target = DirectoryShare::new(tmp.path().join("out"));
        share_record(&float(), false, Some(&target)).unwrap();
        let written = fs::read_to_string(tmp.path().join("out").join("cola-float.txt")).unwrap();
        assert!(written.contains("Cola Float!"), "{written}");
    }
}
