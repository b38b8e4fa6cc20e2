//! # Error Types
//!
//! Domain-level errors raised while interpreting Gemara documents. Storage,
//! schema, and resolution failures have their own error enums in the crates
//! that own those concerns; this one covers what every crate shares.

use thiserror::Error;

use crate::layer::Layer;

/// Top-level error type for the Gemara data model.
#[derive(Error, Debug)]
pub enum GemaraError {
    /// An artifact identifier failed validation.
    #[error("invalid artifact id {id:?}: {reason}")]
    InvalidId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A layer number or name outside the supported hierarchy.
    #[error("unknown layer {0:?}: expected 1-4")]
    UnknownLayer(String),

    /// The layer exists but has no stored artifact shape.
    #[error("{0} artifacts are validated only and have no stored shape")]
    UnsupportedLayer(Layer),

    /// The document did not parse into the typed shape for its layer.
    #[error("cannot parse {layer} document: {source}")]
    Parse {
        /// Layer whose shape was expected.
        layer: Layer,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but carries no `metadata.id`.
    #[error("{0} document is missing metadata.id")]
    MissingId(Layer),

    /// Serialization of a typed document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}
