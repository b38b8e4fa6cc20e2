//! # Artifact Index
//!
//! The persisted `{id -> layer, title, file, digest}` catalog. Listing and
//! lookups go through the index so they never have to parse documents.
//!
//! On disk it is a single JSON file, `index.json`, at the store root:
//!
//! ```json
//! { "version": 1, "entries": [ { "id": "nist-csf", "layer": 1, ... } ] }
//! ```
//!
//! Entries are kept sorted by `(layer, id)` so the file diffs cleanly.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use gemara_core::{ArtifactId, IndexEntry, Layer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

const INDEX_VERSION: u32 = 1;

/// Index entry plus the bookkeeping the store needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: ArtifactId,
    pub layer: Layer,
    pub title: String,
    /// Content file path relative to the store root, `/`-separated.
    pub file: String,
    /// Lowercase hex SHA-256 of the content file bytes.
    pub digest: String,
    pub stored_at: DateTime<Utc>,
}

impl IndexRecord {
    pub fn to_entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            layer: self.layer,
            title: self.title.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    entries: Vec<IndexRecord>,
}

/// In-memory index keyed by `(layer, id)`.
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    records: BTreeMap<(Layer, ArtifactId), IndexRecord>,
}

impl ArtifactIndex {
    /// Load from `path`. A missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io(path)(e)),
        };
        let file: IndexFile =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptIndex {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if file.version != INDEX_VERSION {
            return Err(StoreError::CorruptIndex {
                path: path.to_path_buf(),
                reason: format!("unsupported index version {}", file.version),
            });
        }
        let mut index = Self::default();
        for record in file.entries {
            index.upsert(record);
        }
        Ok(index)
    }

    /// Persist to `path` via a temporary file and rename.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = IndexFile {
            version: INDEX_VERSION,
            entries: self.records.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| StoreError::CorruptIndex {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        write_atomic(path, &json)
    }

    /// Insert or replace. Returns the replaced record, if any.
    pub fn upsert(&mut self, record: IndexRecord) -> Option<IndexRecord> {
        self.records
            .insert((record.layer, record.id.clone()), record)
    }

    pub fn remove(&mut self, layer: Layer, id: &ArtifactId) -> Option<IndexRecord> {
        self.records.remove(&(layer, id.clone()))
    }

    pub fn get(&self, layer: Layer, id: &str) -> Option<&IndexRecord> {
        let id = ArtifactId::new(id).ok()?;
        self.records.get(&(layer, id))
    }

    /// Records of one layer, ordered by id.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &IndexRecord> {
        self.records
            .iter()
            .filter(move |((l, _), _)| *l == layer)
            .map(|(_, record)| record)
    }

    pub fn records(&self) -> impl Iterator<Item = &IndexRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write `bytes` to `path` through a sibling temporary file and a rename,
/// creating parent directories as needed.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
    }
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, bytes).map_err(StoreError::io(&tmp))?;
    fs::rename(&tmp, path).map_err(StoreError::io(path))
}
