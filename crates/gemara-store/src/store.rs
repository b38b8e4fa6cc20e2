//! # Artifact Store
//!
//! Durable, layer-partitioned persistence for Gemara documents.
//!
//! ## Layout
//!
//! ```text
//! {base_dir}/
//!   index.json
//!   layer1/{id}.yaml
//!   layer2/{id}.yaml
//!   layer3/{id}.yaml
//! ```
//!
//! ## Write Ordering
//!
//! Every write lands the content file first and then persists the index,
//! each through a temporary file and a rename. The index lock is held
//! across both steps, so writers in one process are serialized. A crash
//! between the two steps leaves a content file the index does not know
//! about; [`ArtifactStore::verify`] reports it and
//! [`ArtifactStore::rebuild_index`] recovers it. Crash atomicity across
//! both files is not provided.
//!
//! ## Source of Truth
//!
//! The index decides what exists. A content file without an index entry
//! is invisible to `list` and `retrieve` until the index is rebuilt.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gemara_core::artifact::peek_identity;
use gemara_core::{Artifact, ArtifactId, IndexEntry, Layer};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::StoreError;
use crate::index::{sha256_hex, write_atomic, ArtifactIndex, IndexRecord};

pub const INDEX_FILE: &str = "index.json";

/// File extensions recognised as artifact content.
const CONTENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Result of [`ArtifactStore::rebuild_index`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildSummary {
    pub indexed: usize,
    /// Files that could not be indexed, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// One inconsistency found by [`ArtifactStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IndexProblem {
    /// Indexed, but the content file is gone.
    MissingContent { layer: Layer, id: String, file: String },
    /// Content changed since it was indexed.
    DigestMismatch {
        layer: Layer,
        id: String,
        expected: String,
        actual: String,
    },
    /// A content file the index does not list.
    Unindexed { layer: Layer, file: String },
}

#[derive(Debug)]
pub struct ArtifactStore {
    base_dir: PathBuf,
    index: Mutex<ArtifactIndex>,
}

impl ArtifactStore {
    /// Open (or create) a store rooted at `base_dir`.
    ///
    /// Creates the layer directories. An unreadable index is rebuilt from
    /// the content files.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        for layer in Layer::STORABLE {
            let dir = base_dir.join(layer.dir_name());
            fs::create_dir_all(&dir).map_err(StoreError::io(&dir))?;
        }

        let index_path = base_dir.join(INDEX_FILE);
        let index_missing = !index_path.exists();
        let (index, mut rebuild) = match ArtifactIndex::load(&index_path) {
            Ok(index) => (index, false),
            Err(StoreError::CorruptIndex { reason, .. }) => {
                tracing::warn!(path = %index_path.display(), %reason, "index unreadable, rebuilding");
                (ArtifactIndex::default(), true)
            }
            Err(e) => return Err(e),
        };

        let store = Self {
            base_dir,
            index: Mutex::new(index),
        };
        if index_missing && store.has_content()? {
            tracing::info!(path = %index_path.display(), "no index over existing content, rebuilding");
            rebuild = true;
        }
        if rebuild {
            store.rebuild_index()?;
        }
        tracing::debug!(base_dir = %store.base_dir.display(), entries = store.index.lock().len(), "store opened");
        Ok(store)
    }

    /// Root directory, for collaborators such as the bulk loader.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn has_content(&self) -> Result<bool, StoreError> {
        for layer in Layer::STORABLE {
            if !content_files(&self.base_dir.join(layer.dir_name()))?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn index_path(&self) -> PathBuf {
        self.base_dir.join(INDEX_FILE)
    }

    fn content_path(&self, record: &IndexRecord) -> PathBuf {
        self.base_dir.join(&record.file)
    }

    /// All entries of `layer`, ordered by id.
    pub fn list(&self, layer: Layer) -> Result<Vec<IndexEntry>, StoreError> {
        ensure_storable(layer)?;
        Ok(self.index.lock().layer(layer).map(IndexRecord::to_entry).collect())
    }

    /// Full index records of `layer`, ordered by id.
    pub fn records(&self, layer: Layer) -> Result<Vec<IndexRecord>, StoreError> {
        ensure_storable(layer)?;
        Ok(self.index.lock().layer(layer).cloned().collect())
    }

    pub fn contains(&self, layer: Layer, id: &str) -> bool {
        self.index.lock().get(layer, id).is_some()
    }

    /// The stored text of an artifact, byte for byte as submitted.
    pub fn retrieve_raw(&self, layer: Layer, id: &str) -> Result<String, StoreError> {
        ensure_storable(layer)?;
        let record = self
            .index
            .lock()
            .get(layer, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                layer,
                id: id.to_string(),
            })?;
        let path = self.content_path(&record);
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::MissingContent {
                    layer,
                    id: id.to_string(),
                    path,
                }
            } else {
                StoreError::Io { path, source: e }
            }
        })
    }

    /// Load and parse an artifact into its typed layer shape.
    pub fn retrieve(&self, layer: Layer, id: &str) -> Result<Artifact, StoreError> {
        let text = self.retrieve_raw(layer, id)?;
        Ok(Artifact::from_yaml(layer, &text)?)
    }

    /// Serialize a typed artifact and store it under `id`.
    pub fn add(&self, layer: Layer, id: &ArtifactId, artifact: &Artifact) -> Result<(), StoreError> {
        ensure_storable(layer)?;
        if artifact.layer() != layer {
            return Err(StoreError::LayerMismatch {
                expected: layer,
                actual: artifact.layer(),
            });
        }
        let text = artifact.to_yaml()?;
        self.write_document(layer, id, artifact.title().to_string(), text.as_bytes())
    }

    /// Store document text verbatim, keyed by its `metadata.id`.
    ///
    /// Only `metadata.id` and `metadata.title` are read; the rest of the
    /// document need not fit the typed model.
    pub fn store_raw(&self, layer: Layer, content: &str) -> Result<ArtifactId, StoreError> {
        ensure_storable(layer)?;
        let (id, title) = peek_identity(layer, content)?;
        self.write_document(layer, &id, title, content.as_bytes())?;
        Ok(id)
    }

    fn write_document(
        &self,
        layer: Layer,
        id: &ArtifactId,
        title: String,
        content: &[u8],
    ) -> Result<(), StoreError> {
        let file = format!("{}/{id}.yaml", layer.dir_name());
        let path = self.base_dir.join(&file);

        let mut index = self.index.lock();
        write_atomic(&path, content)?;

        let record = IndexRecord {
            id: id.clone(),
            layer,
            title,
            file: file.clone(),
            digest: sha256_hex(content),
            stored_at: Utc::now(),
        };
        let previous = index.upsert(record);
        if let Err(e) = index.save(&self.index_path()) {
            // Keep memory in step with what is on disk.
            match previous {
                Some(prev) => {
                    index.upsert(prev);
                }
                None => {
                    index.remove(layer, id);
                }
            }
            return Err(e);
        }

        // A record rebuilt from a hand-named file is superseded by the
        // canonical `{id}.yaml`; the old file must not outlive it.
        if let Some(prev) = previous.as_ref().filter(|p| p.file != file) {
            let stale = self.content_path(prev);
            match fs::remove_file(&stale) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %stale.display(), error = %e, "could not remove superseded content file");
                }
            }
        }

        tracing::info!(layer = layer.number(), %id, replaced = previous.is_some(), "artifact stored");
        Ok(())
    }

    /// Regenerate the index from the layer directories.
    ///
    /// Each content file is indexed under the `metadata.id` it declares.
    /// When several files declare the same id, the canonical `{id}.yaml`
    /// wins; among non-canonical files the later name wins.
    pub fn rebuild_index(&self) -> Result<RebuildSummary, StoreError> {
        let mut rebuilt = ArtifactIndex::default();
        let mut summary = RebuildSummary::default();

        for layer in Layer::STORABLE {
            for path in content_files(&self.base_dir.join(layer.dir_name()))? {
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        summary.skipped.push((path, e.to_string()));
                        continue;
                    }
                };
                let text = String::from_utf8_lossy(&bytes);
                let (id, title) = match peek_identity(layer, &text) {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "not indexing file");
                        summary.skipped.push((path, e.to_string()));
                        continue;
                    }
                };
                let stored_at = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                let file = relative_file(layer, &path);
                if let Some(existing) = rebuilt.get(layer, id.as_str()) {
                    if is_canonical(layer, &existing.id, &existing.file) {
                        tracing::warn!(path = %path.display(), %id, kept = %existing.file, "duplicate id, keeping canonical file");
                        summary.skipped.push((path, format!("duplicate of {}", existing.file)));
                        continue;
                    }
                    tracing::warn!(path = %path.display(), %id, replaced = %existing.file, "duplicate id");
                }
                rebuilt.upsert(IndexRecord {
                    id,
                    layer,
                    title,
                    file,
                    digest: sha256_hex(&bytes),
                    stored_at,
                });
            }
        }

        summary.indexed = rebuilt.len();
        let mut index = self.index.lock();
        rebuilt.save(&self.index_path())?;
        *index = rebuilt;
        tracing::info!(indexed = summary.indexed, skipped = summary.skipped.len(), "index rebuilt");
        Ok(summary)
    }

    /// Compare the index against the content files.
    pub fn verify(&self) -> Result<Vec<IndexProblem>, StoreError> {
        let index = self.index.lock().clone();
        let mut problems = Vec::new();

        for record in index.records() {
            let path = self.content_path(record);
            match fs::read(&path) {
                Ok(bytes) => {
                    let actual = sha256_hex(&bytes);
                    if actual != record.digest {
                        problems.push(IndexProblem::DigestMismatch {
                            layer: record.layer,
                            id: record.id.to_string(),
                            expected: record.digest.clone(),
                            actual,
                        });
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    problems.push(IndexProblem::MissingContent {
                        layer: record.layer,
                        id: record.id.to_string(),
                        file: record.file.clone(),
                    });
                }
                Err(e) => return Err(StoreError::Io { path, source: e }),
            }
        }

        for layer in Layer::STORABLE {
            let indexed: Vec<&str> = index.layer(layer).map(|r| r.file.as_str()).collect();
            for path in content_files(&self.base_dir.join(layer.dir_name()))? {
                let file = relative_file(layer, &path);
                if !indexed.contains(&file.as_str()) {
                    problems.push(IndexProblem::Unindexed { layer, file });
                }
            }
        }
        Ok(problems)
    }
}

fn ensure_storable(layer: Layer) -> Result<(), StoreError> {
    if layer.is_storable() {
        Ok(())
    } else {
        Err(StoreError::UnsupportedLayer(layer))
    }
}

/// Whether `file` is the name the store itself writes for `id`.
fn is_canonical(layer: Layer, id: &ArtifactId, file: &str) -> bool {
    file == format!("{}/{id}.yaml", layer.dir_name())
}

fn relative_file(layer: Layer, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{name}", layer.dir_name())
}

/// Content files directly inside `dir`, sorted by name. A missing
/// directory has no files.
fn content_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(StoreError::io(dir))?.path();
        let is_content = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext));
        if is_content && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
