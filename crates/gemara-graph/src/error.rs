//! Relationship and query error types.

use gemara_core::Layer;
use gemara_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// The artifact being resolved does not exist. Missing reference
    /// targets are never an error; they become unresolved edges.
    #[error("{layer} artifact {id:?} not found")]
    NotFound { layer: Layer, id: String },

    /// Layer 4 artifacts are not stored, so they have no relationships.
    #[error("relationships are not tracked for {0}")]
    UnsupportedLayer(Layer),

    /// Reading the artifacts failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
