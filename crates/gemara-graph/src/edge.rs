//! Derived reference edges and relationship nodes.
//!
//! Nothing here is persisted. Edges are rebuilt from the cached artifacts
//! every time a node is resolved.

use std::fmt;

use gemara_core::Layer;
use serde::Serialize;

/// One outbound reference from `source_id` to `target_id`.
///
/// `resolved` is false when the target id is absent from its layer. A
/// dangling edge is still an edge; it is reported, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEdge {
    pub source_id: String,
    pub source_layer: Layer,
    pub target_id: String,
    pub target_layer: Layer,
    pub resolved: bool,
    /// Catalog id of whichever endpoint is a control, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ReferenceEdge {
    /// Label for the target end, as shown in a node's `references`.
    pub fn target_label(&self) -> String {
        EndpointLabel {
            id: &self.target_id,
            layer: self.target_layer,
            resolved: self.resolved,
        }
        .to_string()
    }

    /// Label for the source end, as shown in a node's `referenced_by`.
    ///
    /// A referrer was found by scanning, so it always exists.
    pub fn source_label(&self) -> String {
        EndpointLabel {
            id: &self.source_id,
            layer: self.source_layer,
            resolved: true,
        }
        .to_string()
    }
}

struct EndpointLabel<'a> {
    id: &'a str,
    layer: Layer,
    resolved: bool,
}

impl fmt::Display for EndpointLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resolved {
            write!(f, "{} ({})", self.id, self.layer)
        } else {
            write!(f, "{} ({} - NOT FOUND)", self.id, self.layer)
        }
    }
}

/// Per-layer facts attached to a resolved node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeDetails {
    Guidance {
        author: String,
        version: String,
        document_type: Option<String>,
        guideline_count: usize,
    },
    Control {
        catalog_id: String,
        family_id: String,
        objective: String,
    },
    Policy {
        organization: Option<String>,
        version: String,
        objective: Option<String>,
    },
}

/// An artifact together with its inbound and outbound edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipNode {
    pub id: String,
    pub layer: Layer,
    pub title: String,
    pub references: Vec<ReferenceEdge>,
    pub referenced_by: Vec<ReferenceEdge>,
    pub details: NodeDetails,
}

impl RelationshipNode {
    pub fn reference_labels(&self) -> Vec<String> {
        self.references.iter().map(ReferenceEdge::target_label).collect()
    }

    pub fn referenced_by_labels(&self) -> Vec<String> {
        self.referenced_by.iter().map(ReferenceEdge::source_label).collect()
    }

    pub fn dangling(&self) -> impl Iterator<Item = &ReferenceEdge> {
        self.references.iter().filter(|e| !e.resolved)
    }

    /// Flattened, display-ready form for reports.
    pub fn summary(&self) -> RelationshipSummary {
        RelationshipSummary {
            artifact_id: self.id.clone(),
            layer: self.layer,
            title: self.title.clone(),
            references: self.reference_labels(),
            referenced_by: self.referenced_by_labels(),
            details: self.details.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipSummary {
    pub artifact_id: String,
    pub layer: Layer,
    pub title: String,
    pub references: Vec<String>,
    pub referenced_by: Vec<String>,
    pub details: NodeDetails,
}
