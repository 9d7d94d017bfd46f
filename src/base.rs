use crate::cache::{CacheError, Fetcher, OfflineCache, Request};
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Dataset compiled into the binary.
pub const EMBEDDED: &str = include_str!("../data/recipes.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseSource {
    Embedded,
    File(PathBuf),
    Url(Url),
}

impl fmt::Display for BaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseSource::Embedded => write!(f, "embedded"),
            BaseSource::File(path) => write!(f, "{}", path.display()),
            BaseSource::Url(url) => write!(f, "{url}"),
        }
    }
}

impl std::str::FromStr for BaseSource {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty base dataset location".to_string());
        }
        if s.eq_ignore_ascii_case("embedded") {
            return Ok(BaseSource::Embedded);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Url::parse(s)
                .map(BaseSource::Url)
                .map_err(|e| format!("invalid base dataset URL '{s}': {e}"));
        }
        Ok(BaseSource::File(PathBuf::from(s)))
    }
}

#[derive(Debug, Error)]
pub enum BaseError {
    #[error("cannot read base dataset {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot fetch base dataset: {0}")]
    Fetch(#[from] CacheError),
}

/// Parse a dataset document. Bad JSON or a non-array top level yields an
/// empty dataset.
pub fn parse(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("base dataset is not an array, treating as empty");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "base dataset is not valid JSON, treating as empty");
            Vec::new()
        }
    }
}

pub fn load(source: &BaseSource, cache: &OfflineCache, fetcher: &dyn Fetcher) -> Result<Vec<Value>, BaseError> {
    let records = match source {
        BaseSource::Embedded => parse(EMBEDDED),
        BaseSource::File(path) => {
            let text = fs::read_to_string(path).map_err(|e| BaseError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            parse(&text)
        }
        BaseSource::Url(url) => {
            let resp = cache.fetch(&Request::get(url.clone()), url, fetcher)?;
            parse(&String::from_utf8_lossy(&resp.body))
        }
    };
    info!(%source, count = records.len(), "base dataset loaded");
    Ok(records)
}
