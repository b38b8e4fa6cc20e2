//! # Artifacts
//!
//! [`Artifact`] is the typed union of the storable layer documents.
//! [`IndexEntry`] is the lightweight `{id, layer, title}` view used for
//! listing without materializing whole documents.
//!
//! [`peek_identity`] reads only `metadata.id` and `metadata.title` from
//! raw text. The raw write path depends on it so that a document which
//! validates against its schema but does not fit the typed model can still
//! be stored verbatim.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::GemaraError;
use crate::guidance::GuidanceDocument;
use crate::identity::ArtifactId;
use crate::layer::Layer;
use crate::metadata::Metadata;
use crate::policy::PolicyDocument;

/// A parsed document of one storable layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Guidance(GuidanceDocument),
    Catalog(Catalog),
    Policy(PolicyDocument),
}

impl Artifact {
    /// Parse YAML (or JSON) text into the typed shape for `layer`.
    pub fn from_yaml(layer: Layer, content: &str) -> Result<Self, GemaraError> {
        let parse_err = |source| GemaraError::Parse { layer, source };
        let artifact = match layer {
            Layer::Guidance => Artifact::Guidance(serde_yaml::from_str(content).map_err(parse_err)?),
            Layer::Controls => Artifact::Catalog(serde_yaml::from_str(content).map_err(parse_err)?),
            Layer::Policy => Artifact::Policy(serde_yaml::from_str(content).map_err(parse_err)?),
            Layer::Evaluation => return Err(GemaraError::UnsupportedLayer(layer)),
        };
        Ok(artifact)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, GemaraError> {
        let text = match self {
            Artifact::Guidance(doc) => serde_yaml::to_string(doc)?,
            Artifact::Catalog(cat) => serde_yaml::to_string(cat)?,
            Artifact::Policy(pol) => serde_yaml::to_string(pol)?,
        };
        Ok(text)
    }

    pub fn layer(&self) -> Layer {
        match self {
            Artifact::Guidance(_) => Layer::Guidance,
            Artifact::Catalog(_) => Layer::Controls,
            Artifact::Policy(_) => Layer::Policy,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Artifact::Guidance(doc) => &doc.metadata,
            Artifact::Catalog(cat) => &cat.metadata,
            Artifact::Policy(pol) => &pol.metadata,
        }
    }

    /// The raw `metadata.id`. May be empty for documents built in code;
    /// use [`Artifact::artifact_id`] where a validated id is required.
    pub fn id(&self) -> &str {
        &self.metadata().id
    }

    pub fn title(&self) -> &str {
        &self.metadata().title
    }

    /// The validated id, or [`GemaraError::MissingId`] when absent.
    pub fn artifact_id(&self) -> Result<ArtifactId, GemaraError> {
        if self.id().is_empty() {
            return Err(GemaraError::MissingId(self.layer()));
        }
        ArtifactId::new(self.id())
    }

    /// Index entry describing this artifact.
    pub fn index_entry(&self) -> Result<IndexEntry, GemaraError> {
        Ok(IndexEntry {
            id: self.artifact_id()?,
            layer: self.layer(),
            title: self.title().to_string(),
        })
    }

    pub fn as_guidance(&self) -> Option<&GuidanceDocument> {
        match self {
            Artifact::Guidance(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_catalog(&self) -> Option<&Catalog> {
        match self {
            Artifact::Catalog(cat) => Some(cat),
            _ => None,
        }
    }

    pub fn as_policy(&self) -> Option<&PolicyDocument> {
        match self {
            Artifact::Policy(pol) => Some(pol),
            _ => None,
        }
    }
}

impl From<GuidanceDocument> for Artifact {
    fn from(doc: GuidanceDocument) -> Self {
        Artifact::Guidance(doc)
    }
}

impl From<Catalog> for Artifact {
    fn from(cat: Catalog) -> Self {
        Artifact::Catalog(cat)
    }
}

impl From<PolicyDocument> for Artifact {
    fn from(pol: PolicyDocument) -> Self {
        Artifact::Policy(pol)
    }
}

/// Catalog entry for one stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: ArtifactId,
    pub layer: Layer,
    pub title: String,
}

/// Read `metadata.id` and `metadata.title` from raw document text without
/// parsing the rest of the document into a typed shape.
///
/// Non-string ids (for example a bare number) are rendered to their YAML
/// scalar text. A missing or empty id is [`GemaraError::MissingId`].
pub fn peek_identity(layer: Layer, content: &str) -> Result<(ArtifactId, String), GemaraError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|source| GemaraError::Parse { layer, source })?;
    let metadata = value.get("metadata");
    let id = metadata
        .and_then(|m| m.get("id"))
        .and_then(scalar_text)
        .filter(|id| !id.is_empty())
        .ok_or(GemaraError::MissingId(layer))?;
    let title = metadata
        .and_then(|m| m.get("title"))
        .and_then(scalar_text)
        .unwrap_or_default();
    Ok((ArtifactId::new(id)?, title))
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
