//! # Schema Source
//!
//! Fetches schema text by logical name and memoizes it for the lifetime of
//! the [`SchemaSource`]. There is no expiry: a schema changed at its origin
//! after the first fetch is not observed again by the same instance.
//!
//! Two origins are supported. [`SchemaOrigin::Remote`] issues a GET to
//! `<base>/<file>` and treats any non-2xx status as a fetch error.
//! [`SchemaOrigin::Directory`] reads `<dir>/<file>` from disk, which is how
//! tests and offline hosts use the repository `schemas/` directory.
//!
//! Failures are returned to the caller and never cached, so the next call
//! for the same name retries.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gemara_core::Layer;
use parking_lot::RwLock;
use url::Url;

use crate::error::SchemaFetchError;

/// Logical name of a schema fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaName {
    /// Shared scalar definitions (`Id`, `Date`, `Strength`).
    Base,
    /// Shared `Metadata` and `Applicability` definitions.
    Metadata,
    /// Shared `Mapping` and `MappingEntry` definitions.
    Mapping,
    /// The layer-specific document schema.
    Layer(Layer),
}

impl SchemaName {
    /// Fragments every layer schema is composed with, in composition order.
    pub const SHARED: [SchemaName; 3] = [SchemaName::Base, SchemaName::Metadata, SchemaName::Mapping];

    /// File name at the origin.
    pub fn file_name(self) -> String {
        match self {
            SchemaName::Base => "base.schema.json".to_string(),
            SchemaName::Metadata => "metadata.schema.json".to_string(),
            SchemaName::Mapping => "mapping.schema.json".to_string(),
            SchemaName::Layer(layer) => format!("layer-{}.schema.json", layer.number()),
        }
    }

    /// Parse `base`, `metadata`, `mapping`, or a layer spelling (`layer-2`, `3`).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let stem = normalized
            .strip_suffix(".schema.json")
            .unwrap_or(&normalized);
        match stem {
            "base" => Some(SchemaName::Base),
            "metadata" => Some(SchemaName::Metadata),
            "mapping" => Some(SchemaName::Mapping),
            other => other.parse::<Layer>().ok().map(SchemaName::Layer),
        }
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaName::Base => f.write_str("base"),
            SchemaName::Metadata => f.write_str("metadata"),
            SchemaName::Mapping => f.write_str("mapping"),
            SchemaName::Layer(layer) => write!(f, "layer-{}", layer.number()),
        }
    }
}

/// Where schema text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    Remote(Url),
    Directory(PathBuf),
}

impl SchemaOrigin {
    /// Remote origin rooted at `base`.
    ///
    /// A trailing `/` is added when missing so that joining a file name
    /// appends to the path instead of replacing its last segment.
    pub fn remote(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        SchemaOrigin::Remote(base)
    }

    /// Where `name` lives at this origin, as a URL or file path.
    pub fn location(&self, name: SchemaName) -> String {
        match self {
            SchemaOrigin::Remote(base) => base
                .join(&name.file_name())
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{base}{}", name.file_name())),
            SchemaOrigin::Directory(dir) => dir.join(name.file_name()).display().to_string(),
        }
    }
}

/// Memoizing schema loader.
///
/// Shared behind an `Arc` by every validator in the process. The cache is
/// unbounded; it holds at most seven entries.
pub struct SchemaSource {
    origin: SchemaOrigin,
    http: reqwest::Client,
    cache: RwLock<HashMap<SchemaName, Arc<str>>>,
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSource")
            .field("origin", &self.origin)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl SchemaSource {
    /// Build a source for `origin`, applying `timeout` to every HTTP fetch.
    pub fn new(origin: SchemaOrigin, timeout: Duration) -> Result<Self, SchemaFetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SchemaFetchError::Client)?;
        Ok(Self {
            origin,
            http,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Directory-backed source. Never touches the network.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, SchemaFetchError> {
        Self::new(SchemaOrigin::Directory(dir.into()), Duration::from_secs(30))
    }

    pub fn origin(&self) -> &SchemaOrigin {
        &self.origin
    }

    pub fn location(&self, name: SchemaName) -> String {
        self.origin.location(name)
    }

    /// Number of names currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Return the text of `name`, fetching it on first use.
    pub async fn fetch(&self, name: SchemaName) -> Result<Arc<str>, SchemaFetchError> {
        let cached = self.cache.read().get(&name).cloned();
        if let Some(text) = cached {
            tracing::debug!(schema = %name, "schema cache hit");
            return Ok(text);
        }

        let text: Arc<str> = match &self.origin {
            SchemaOrigin::Remote(base) => self.fetch_remote(base, name).await?,
            SchemaOrigin::Directory(dir) => {
                let path = dir.join(name.file_name());
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| SchemaFetchError::Io { path, source })?
            }
        }
        .into();

        // Two concurrent misses may both fetch; the first insert wins.
        let mut cache = self.cache.write();
        let cached = cache.entry(name).or_insert(text);
        tracing::info!(schema = %name, bytes = cached.len(), "schema loaded");
        Ok(Arc::clone(cached))
    }

    async fn fetch_remote(&self, base: &Url, name: SchemaName) -> Result<String, SchemaFetchError> {
        let url = base
            .join(&name.file_name())
            .map_err(|e| SchemaFetchError::InvalidUrl {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(schema = %name, %url, "fetching schema");

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SchemaFetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if resp.status() != reqwest::StatusCode::OK {
            tracing::warn!(schema = %name, %url, status = resp.status().as_u16(), "schema fetch rejected");
            return Err(SchemaFetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(|source| SchemaFetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}
