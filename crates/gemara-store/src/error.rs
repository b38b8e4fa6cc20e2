//! Storage error types.

use std::path::PathBuf;

use gemara_core::{GemaraError, Layer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure. The operation was aborted; nothing is rolled back.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No index entry for the id in this layer.
    #[error("{layer} artifact {id:?} not found")]
    NotFound { layer: Layer, id: String },

    /// The index lists the artifact but its content file is gone.
    #[error("{layer} artifact {id:?} is indexed but {} is missing", path.display())]
    MissingContent { layer: Layer, id: String, path: PathBuf },

    /// The document carries no usable `metadata.id`.
    #[error("{0} document is missing metadata.id")]
    MissingId(Layer),

    /// Layer 4 documents are validated only.
    #[error("{0} artifacts cannot be stored")]
    UnsupportedLayer(Layer),

    /// `add` was given an artifact of a different layer.
    #[error("cannot store a {actual} artifact under {expected}")]
    LayerMismatch { expected: Layer, actual: Layer },

    /// The persisted index could not be decoded.
    #[error("corrupt index {}: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    /// The document could not be interpreted (parse failure, invalid id).
    #[error(transparent)]
    Document(GemaraError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<GemaraError> for StoreError {
    fn from(err: GemaraError) -> Self {
        match err {
            GemaraError::MissingId(layer) => StoreError::MissingId(layer),
            GemaraError::UnsupportedLayer(layer) => StoreError::UnsupportedLayer(layer),
            other => StoreError::Document(other),
        }
    }
}
