use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record in the working collection came from. Computed at merge
/// time and never written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Base,
    Custom,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Base => write!(f, "base"),
            Source::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Source::Base),
            "custom" => Ok(Source::Custom),
            _ => Err(format!("unknown source: {s} (valid: base, custom)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdultVariant {
    pub name: String,
    pub extra: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub method: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult_variant: Option<AdultVariant>,
    #[serde(skip)]
    pub source: Option<Source>,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            name: name.into(),
            tags: Vec::new(),
            ingredients: Vec::new(),
            method: Vec::new(),
            notes: String::new(),
            adult_variant: None,
            source: None,
        }
    }

    /// The record as it is written to storage. `source` never appears.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn without_source(mut self) -> Self {
        self.source = None;
        self
    }

    pub fn is_base(&self) -> bool {
        self.source == Some(Source::Base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            id: "cola-float".to_string(),
            name: "Cola Float".to_string(),
            tags: vec!["classic".to_string(), "dessert".to_string()],
            ingredients: vec!["12 oz cola".to_string(), "1 scoop vanilla".to_string()],
            method: vec!["Pour cola over ice cream".to_string()],
            notes: String::new(),
            adult_variant: None,
            source: Some(Source::Base),
        }
    }

    #[test]
    fn source_from_str_valid() {
        assert_eq!("base".parse::<Source>().unwrap(), Source::Base);
        assert_eq!("custom".parse::<Source>().unwrap(), Source::Custom);
    }

    #[test]
    fn source_from_str_case_insensitive() {
        assert_eq!("BASE".parse::<Source>().unwrap(), Source::Base);
        assert_eq!("Custom".parse::<Source>().unwrap(), Source::Custom);
    }

    #[test]
    fn source_from_str_invalid() {
        assert!("user".parse::<Source>().is_err());
        assert!("".parse::<Source>().is_err());
    }

    #[test]
    fn display_round_trip_source() {
        for variant in [Source::Base, Source::Custom] {
            let s = variant.to_string();
            assert_eq!(s.parse::<Source>().unwrap(), variant);
        }
    }

    #[test]
    fn source_never_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("source"), "{json}");
        assert!(!json.contains("base\""), "{json}");
    }

    #[test]
    fn adult_variant_absent_from_json_when_none() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("adult_variant"), "{json}");
    }

    #[test]
    fn adult_variant_round_trip() {
        let mut rec = sample();
        rec.adult_variant = Some(AdultVariant {
            name: "Cola Float — Spiced".to_string(),
            extra: vec!["1 oz spiced rum".to_string()],
            note: "Serve cold".to_string(),
        });
        let json = serde_json::to_string(&rec).unwrap();
        let restored: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.adult_variant, rec.adult_variant);
        assert_eq!(restored.source, None);
    }

    #[test]
    fn missing_sequences_default_to_empty() {
        let restored: Record = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(restored.tags.is_empty());
        assert!(restored.ingredients.is_empty());
        assert!(restored.method.is_empty());
        assert_eq!(restored.name, "");
    }

    #[test]
    fn to_value_strips_source() {
        let value = sample().to_value();
        assert!(value.get("source").is_none());
        assert_eq!(value["id"], "cola-float");
    }
}
