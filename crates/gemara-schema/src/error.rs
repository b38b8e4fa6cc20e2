//! Error types for schema retrieval and composition.
//!
//! A document that fails validation is not an error here: it produces a
//! [`ValidationReport`](crate::ValidationReport) with `valid = false`.
//! These enums cover the cases where validation could not be attempted.

use std::path::PathBuf;

use gemara_core::Layer;
use thiserror::Error;

/// A schema fragment could not be loaded from its origin.
///
/// Never cached: the next fetch for the same name tries again.
#[derive(Error, Debug)]
pub enum SchemaFetchError {
    /// Network or transport failure talking to the remote origin.
    #[error("failed to fetch schema from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote origin answered with a non-success status.
    #[error("failed to fetch schema from {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// Reading a schema file from the local directory origin failed.
    #[error("failed to read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema URL could not be built from the base URL.
    #[error("cannot build schema URL for {name}: {reason}")]
    InvalidUrl { name: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("cannot initialise schema HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Validation could not run.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error(transparent)]
    Fetch(#[from] SchemaFetchError),

    /// A fetched schema is not valid JSON.
    #[error("schema {name} is not valid JSON: {reason}")]
    InvalidSchema { name: String, reason: String },

    /// Two fragments declare the same definition with different bodies.
    #[error("definition {definition:?} from {name} conflicts with an earlier fragment")]
    Composition { name: String, definition: String },

    /// The composed schema was rejected by the validator.
    #[error("cannot compile composed schema for {layer}: {reason}")]
    Build { layer: Layer, reason: String },
}
