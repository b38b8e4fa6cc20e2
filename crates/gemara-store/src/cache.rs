//! # Artifact Cache
//!
//! Per-layer `id -> parsed artifact` maps in front of the [`ArtifactStore`].
//!
//! ## Policy
//!
//! Cache-aside with fill on miss. [`ArtifactCache::get`] returns a cached
//! entry when present and otherwise reads through to the store, memoizing
//! the parsed result. Entries are not refreshed on their own: a document
//! rewritten through some other path stays stale here until it is evicted
//! with [`ArtifactCache::evict`] or replaced with [`ArtifactCache::put`].
//!
//! With a store, the store's index decides what exists: a cached entry
//! whose id is no longer indexed is dropped instead of served, and
//! [`ArtifactCache::all`] lists only indexed ids. Without a store the
//! cache is the only state and is filled exclusively by `put`.

use std::collections::HashMap;
use std::sync::Arc;

use gemara_core::{Artifact, ArtifactId, Layer};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::ArtifactStore;

type LayerMap = RwLock<HashMap<ArtifactId, Arc<Artifact>>>;

#[derive(Debug, Default)]
pub struct ArtifactCache {
    store: Option<Arc<ArtifactStore>>,
    guidance: LayerMap,
    catalogs: LayerMap,
    policies: LayerMap,
}

impl ArtifactCache {
    pub fn new(store: Option<Arc<ArtifactStore>>) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Cache with no backing store.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<&Arc<ArtifactStore>> {
        self.store.as_ref()
    }

    fn slot(&self, layer: Layer) -> Result<&LayerMap, StoreError> {
        match layer {
            Layer::Guidance => Ok(&self.guidance),
            Layer::Controls => Ok(&self.catalogs),
            Layer::Policy => Ok(&self.policies),
            Layer::Evaluation => Err(StoreError::UnsupportedLayer(layer)),
        }
    }

    /// Cached artifact, filling from the store on a miss.
    ///
    /// `Ok(None)` when neither the cache nor the store has the id.
    pub fn get(&self, layer: Layer, id: &str) -> Result<Option<Arc<Artifact>>, StoreError> {
        let slot = self.slot(layer)?;
        let Ok(key) = ArtifactId::new(id) else {
            return Ok(None);
        };
        let hit = slot.read().get(&key).cloned();
        let Some(store) = &self.store else {
            return Ok(hit);
        };
        if !store.contains(layer, id) {
            if hit.is_some() {
                tracing::debug!(layer = layer.number(), id, "dropping cached artifact no longer indexed");
                slot.write().remove(&key);
            }
            return Ok(None);
        }
        if hit.is_some() {
            return Ok(hit);
        }

        let artifact = match store.retrieve(layer, id) {
            Ok(artifact) => artifact,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        tracing::debug!(layer = layer.number(), id, "cache filled from store");
        let mut map = slot.write();
        let entry = map.entry(key).or_insert_with(|| Arc::new(artifact));
        Ok(Some(Arc::clone(entry)))
    }

    /// Insert or replace an artifact. Never touches the store.
    pub fn put(&self, artifact: Artifact) -> Result<Arc<Artifact>, StoreError> {
        let id = artifact.artifact_id()?;
        let slot = self.slot(artifact.layer())?;
        let artifact = Arc::new(artifact);
        slot.write().insert(id, Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Drop a cached entry so the next `get` reads through again.
    pub fn evict(&self, layer: Layer, id: &str) -> bool {
        let (Ok(slot), Ok(key)) = (self.slot(layer), ArtifactId::new(id)) else {
            return false;
        };
        slot.write().remove(&key).is_some()
    }

    /// Every artifact of `layer`, ordered by id.
    ///
    /// With a store, exactly the indexed ids, each filled on demand.
    /// Stored documents that no longer parse into the typed shape are
    /// skipped with a warning.
    pub fn all(&self, layer: Layer) -> Result<Vec<Arc<Artifact>>, StoreError> {
        let slot = self.slot(layer)?;
        if let Some(store) = &self.store {
            let mut out = Vec::new();
            for entry in store.list(layer)? {
                match self.get(layer, entry.id.as_str()) {
                    Ok(Some(artifact)) => out.push(artifact),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(layer = layer.number(), id = %entry.id, error = %e, "skipping unreadable artifact");
                    }
                }
            }
            return Ok(out);
        }
        let map = slot.read();
        let mut ids: Vec<&ArtifactId> = map.keys().collect();
        ids.sort();
        Ok(ids.into_iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    /// Number of cached artifacts in `layer`.
    pub fn len(&self, layer: Layer) -> usize {
        self.slot(layer).map(|s| s.read().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        Layer::STORABLE.iter().all(|&l| self.len(l) == 0)
    }
}
