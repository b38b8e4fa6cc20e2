//! Bulk and single-file artifact loading.
//!
//! The bulk loader is lenient: a file that does not parse, or parses to a
//! document without `metadata.id`, is skipped and logged at `debug`. Only
//! failures to read a layer directory itself abort the scan.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gemara_core::{Artifact, Layer};
use serde::Serialize;

use crate::cache::ArtifactCache;
use crate::error::StoreError;

/// Counts from [`load_artifacts_dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub guidance: usize,
    pub catalogs: usize,
    pub policies: usize,
    pub skipped: Vec<PathBuf>,
}

impl LoadSummary {
    pub fn loaded(&self) -> usize {
        self.guidance + self.catalogs + self.policies
    }

    fn bump(&mut self, layer: Layer) {
        match layer {
            Layer::Guidance => self.guidance += 1,
            Layer::Controls => self.catalogs += 1,
            Layer::Policy => self.policies += 1,
            Layer::Evaluation => {}
        }
    }
}

fn accepts(layer: Layer, path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => true,
        Some("json") => layer.accepts_json_files(),
        _ => false,
    }
}

/// Load every artifact under `base/layer{1,2,3}` into `cache`.
///
/// Missing layer directories are skipped. Nothing is written to the store.
pub fn load_artifacts_dir(base: &Path, cache: &ArtifactCache) -> Result<LoadSummary, StoreError> {
    let mut summary = LoadSummary::default();

    for layer in Layer::STORABLE {
        let dir = base.join(layer.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StoreError::io(&dir)(e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && accepts(layer, p))
            .collect();
        paths.sort();

        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| Artifact::from_yaml(layer, &text).map_err(|e| e.to_string()));
            let artifact = match parsed {
                Ok(artifact) if !artifact.id().is_empty() => artifact,
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "skipping artifact without metadata.id");
                    summary.skipped.push(path);
                    continue;
                }
                Err(reason) => {
                    tracing::debug!(path = %path.display(), %reason, "skipping unparsable artifact");
                    summary.skipped.push(path);
                    continue;
                }
            };
            match cache.put(artifact) {
                Ok(_) => summary.bump(layer),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping artifact");
                    summary.skipped.push(path);
                }
            }
        }
    }

    tracing::info!(
        base = %base.display(),
        loaded = summary.loaded(),
        skipped = summary.skipped.len(),
        "artifacts loaded"
    );
    Ok(summary)
}

/// Load a single YAML/JSON file, cache it, and persist it when the cache
/// has a store behind it.
///
/// A failed persist is logged and the parsed artifact is still returned,
/// but the cache will not serve it while its id is absent from the store's
/// index.
pub fn load_file(cache: &ArtifactCache, layer: Layer, path: &Path) -> Result<Arc<Artifact>, StoreError> {
    let text = fs::read_to_string(path).map_err(StoreError::io(path))?;
    let artifact = Artifact::from_yaml(layer, &text)?;
    let id = artifact.artifact_id()?;
    let artifact = cache.put(artifact)?;

    if let Some(store) = cache.store() {
        if let Err(e) = store.add(layer, &id, &artifact) {
            tracing::warn!(layer = layer.number(), %id, error = %e, "loaded artifact was not persisted");
        }
    }
    Ok(artifact)
}
