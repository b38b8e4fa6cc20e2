//! # Artifact Identity
//!
//! Artifact ids come from `metadata.id` in submitted documents and double as
//! file stems in the store, so they are validated once at the boundary and
//! carried as a newtype afterwards.
//!
//! ## Invariant
//!
//! An `ArtifactId` is non-empty, at most 128 bytes, contains no path
//! separators, whitespace, or control characters, and does not start with
//! a dot. Ids are unique within a layer, not across layers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GemaraError;

const MAX_ID_LEN: usize = 128;

/// Validated identifier of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, GemaraError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_id(id: &str) -> Result<(), GemaraError> {
    let reject = |reason: &str| {
        Err(GemaraError::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        })
    };
    if id.is_empty() {
        return reject("id must not be empty");
    }
    if id.len() > MAX_ID_LEN {
        return reject("id exceeds 128 bytes");
    }
    if id.starts_with('.') {
        return reject("id must not start with '.'");
    }
    if let Some(c) = id
        .chars()
        .find(|c| matches!(c, '/' | '\\' | ':') || c.is_whitespace() || c.is_control())
    {
        return reject(&format!("id contains forbidden character {c:?}"));
    }
    Ok(())
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = GemaraError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ArtifactId::new(s)
    }
}

impl TryFrom<&str> for ArtifactId {
    type Error = GemaraError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ArtifactId::new(s)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> String {
        id.0
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ArtifactId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ArtifactId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
