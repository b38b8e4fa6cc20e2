//! # Application Context
//!
//! Everything a command needs, built once per process from
//! [`GemaraConfig`] and passed by reference.
//!
//! Store initialisation failure is not fatal: the context logs a warning
//! and runs cache-only, reading the artifacts directory through the bulk
//! loader instead.

use std::sync::Arc;

use gemara_core::{ArtifactId, Layer};
use gemara_graph::{CatalogQueries, RelationshipResolver};
use gemara_schema::{SchemaError, SchemaFetchError, SchemaSource, ValidationReport, Validator};
use gemara_store::{load_artifacts_dir, ArtifactCache, ArtifactStore, StoreError};
use thiserror::Error;

use crate::config::GemaraConfig;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("schema source: {0}")]
    SchemaSource(#[from] SchemaFetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A write was requested while running cache-only.
    #[error("artifact store is not available (running without a store)")]
    StoreUnavailable,
}

/// Result of the validate-then-store flow.
#[derive(Debug)]
pub enum StoreOutcome {
    Stored { id: ArtifactId, report: ValidationReport },
    /// Validation failed; nothing was written.
    Rejected(ValidationReport),
}

impl StoreOutcome {
    pub fn report(&self) -> &ValidationReport {
        match self {
            StoreOutcome::Stored { report, .. } | StoreOutcome::Rejected(report) => report,
        }
    }
}

pub struct AppContext {
    config: GemaraConfig,
    validator: Validator,
    store: Option<Arc<ArtifactStore>>,
    cache: Arc<ArtifactCache>,
}

impl AppContext {
    pub fn new(config: GemaraConfig) -> Result<Self, ContextError> {
        let source = Arc::new(SchemaSource::new(config.schema_origin(), config.fetch_timeout)?);
        let validator = Validator::new(source);

        let store = if config.use_store {
            match ArtifactStore::open(&config.artifacts_dir) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(
                        dir = %config.artifacts_dir.display(),
                        error = %e,
                        "artifact store unavailable, continuing cache-only"
                    );
                    None
                }
            }
        } else {
            None
        };

        let cache = Arc::new(ArtifactCache::new(store.clone()));
        if store.is_none() {
            load_artifacts_dir(&config.artifacts_dir, &cache)?;
        }

        Ok(Self {
            config,
            validator,
            store,
            cache,
        })
    }

    pub fn config(&self) -> &GemaraConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn store(&self) -> Option<&Arc<ArtifactStore>> {
        self.store.as_ref()
    }

    pub fn require_store(&self) -> Result<&Arc<ArtifactStore>, ContextError> {
        self.store.as_ref().ok_or(ContextError::StoreUnavailable)
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn resolver(&self) -> RelationshipResolver<'_> {
        RelationshipResolver::new(&self.cache)
    }

    pub fn queries(&self) -> CatalogQueries<'_> {
        CatalogQueries::new(&self.cache)
    }

    /// Validate `content` against `layer` and, if it passes, store it
    /// verbatim. The cached copy of the id is evicted so later reads see
    /// the new content.
    pub async fn store_document(&self, layer: Layer, content: &str) -> Result<StoreOutcome, ContextError> {
        let store = self.require_store()?;
        if !layer.is_storable() {
            return Err(StoreError::UnsupportedLayer(layer).into());
        }

        let report = self.validator.validate(content, layer).await?;
        if !report.valid {
            return Ok(StoreOutcome::Rejected(report));
        }

        let id = store.store_raw(layer, content)?;
        self.cache.evict(layer, id.as_str());
        Ok(StoreOutcome::Stored { id, report })
    }
}
