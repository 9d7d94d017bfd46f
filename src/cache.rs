//! Offline read-through cache for remote assets such as the base dataset.
//!
//! Entries live under `<root>/<generation>/<sha256 of url>`. Only one
//! generation is active: [`OfflineCache::activate`] removes every other one.
//! An offline miss is reported as the network error.

use reqwest::Url;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CACHE_NAME: &str = "sodabar-v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Network side of the cache.
pub trait Fetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher for sessions without network access; every request fails.
pub struct Offline;

impl Fetcher for Offline {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Network {
            url: url.to_string(),
            reason: "offline".to_string(),
        })
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sodabar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let resp = self.client.get(url.clone()).send().map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().map_err(network)?.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Request {
            method: "GET".to_string(),
            url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Cache,
    Network,
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: Vec<u8>,
    pub served: Served,
}

#[derive(Debug, Clone)]
pub struct OfflineCache {
    root: PathBuf,
    generation: String,
}

fn entry_name(url: &Url) -> String {
    Sha256::digest(url.as_str().as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl OfflineCache {
    pub fn new(root: impl Into<PathBuf>, generation: impl Into<String>) -> Self {
        OfflineCache {
            root: root.into(),
            generation: generation.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self) -> PathBuf {
        self.root.join(&self.generation)
    }

    pub fn lookup(&self, url: &Url) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.generation_dir().join(entry_name(url))) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn put(&self, url: &Url, body: &[u8]) -> Result<(), CacheError> {
        let dir = self.generation_dir();
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(body)?;
        tmp.persist(dir.join(entry_name(url)))
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    /// Precache `assets` into the current generation. Any failure aborts.
    pub fn install(&self, assets: &[Url], fetcher: &dyn Fetcher) -> Result<(), CacheError> {
        for url in assets {
            let body = fetcher.fetch(url)?;
            self.put(url, &body)?;
        }
        info!(generation = %self.generation, count = assets.len(), "cache installed");
        Ok(())
    }

    pub fn generations(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete every generation except the current one. Returns the names
    /// removed.
    pub fn activate(&self) -> Result<Vec<String>, CacheError> {
        let stale: Vec<String> = self
            .generations()?
            .into_iter()
            .filter(|name| *name != self.generation)
            .collect();
        for name in &stale {
            fs::remove_dir_all(self.root.join(name))?;
            debug!(generation = %name, "removed stale cache");
        }
        Ok(stale)
    }

    /// Delete every generation, including the current one.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let all = self.generations()?;
        for name in &all {
            fs::remove_dir_all(self.root.join(name))?;
        }
        Ok(all.len())
    }

    /// Serve `req`. Same-origin GETs are cache-first, then network (storing
    /// a copy). Everything else goes straight to the network.
    pub fn fetch(&self, req: &Request, scope: &Url, fetcher: &dyn Fetcher) -> Result<Response, CacheError> {
        let url = &req.url;
        if !req.method.eq_ignore_ascii_case("GET") || url.origin() != scope.origin() {
            let body = fetcher.fetch(url)?;
            return Ok(Response {
                body,
                served: Served::PassThrough,
            });
        }

        match self.lookup(url) {
            Ok(Some(body)) => {
                debug!(%url, "served from cache");
                return Ok(Response {
                    body,
                    served: Served::Cache,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(%url, error = %e, "cache lookup failed"),
        }

        match fetcher.fetch(url) {
            Ok(body) => {
                if let Err(e) = self.put(url, &body) {
                    warn!(%url, error = %e, "failed to cache response");
                }
                Ok(Response {
                    body,
                    served: Served::Network,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
