//! # Relationship Resolver
//!
//! Computes a node's inbound and outbound edges on demand by scanning the
//! cached artifacts.
//!
//! | Source layer | `references` | `referenced_by` |
//! |--------------|--------------|-----------------|
//! | 1 guidance | none | controls whose guideline mappings name it |
//! | 2 control | guideline-mapping targets (layer 1) | policies whose control references name it |
//! | 3 policy | guidance references (layer 1), control references (layer 2) | none |
//!
//! Layer 2 nodes are controls, addressed by control id and searched across
//! every catalog in id order. Every matching mapping yields its own edge, so
//! two mappings to the same target produce two edges.
//!
//! Resolution is total: a missing target is an unresolved edge. Only a
//! missing source artifact fails.

use std::sync::Arc;

use gemara_core::{Artifact, Catalog, Control, ControlFamily, Layer, PolicyDocument};
use gemara_store::ArtifactCache;

use crate::edge::{NodeDetails, ReferenceEdge, RelationshipNode};
use crate::error::ResolveError;

pub struct RelationshipResolver<'a> {
    cache: &'a ArtifactCache,
}

/// A control located inside its catalog.
pub(crate) struct ControlHit<'c> {
    pub catalog: &'c Catalog,
    pub family: &'c ControlFamily,
    pub control: &'c Control,
}

/// Catalogs in id order, skipping any non-catalog entries.
pub(crate) fn catalogs(artifacts: &[Arc<Artifact>]) -> impl Iterator<Item = &Catalog> {
    artifacts.iter().filter_map(|a| a.as_catalog())
}

pub(crate) fn policies(artifacts: &[Arc<Artifact>]) -> impl Iterator<Item = &PolicyDocument> {
    artifacts.iter().filter_map(|a| a.as_policy())
}

/// First control with `id` across `catalogs`.
pub(crate) fn find_control<'c>(
    catalogs: impl IntoIterator<Item = &'c Catalog>,
    id: &str,
) -> Option<ControlHit<'c>> {
    catalogs.into_iter().find_map(|catalog| {
        catalog.find_control(id).map(|(family, control)| ControlHit {
            catalog,
            family,
            control,
        })
    })
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(cache: &'a ArtifactCache) -> Self {
        Self { cache }
    }

    pub fn resolve(&self, id: &str, layer: Layer) -> Result<RelationshipNode, ResolveError> {
        let node = match layer {
            Layer::Guidance => self.resolve_guidance(id)?,
            Layer::Controls => self.resolve_control(id)?,
            Layer::Policy => self.resolve_policy(id)?,
            Layer::Evaluation => return Err(ResolveError::UnsupportedLayer(layer)),
        };
        tracing::debug!(
            layer = layer.number(),
            id,
            references = node.references.len(),
            referenced_by = node.referenced_by.len(),
            dangling = node.dangling().count(),
            "relationships resolved"
        );
        Ok(node)
    }

    fn resolve_guidance(&self, id: &str) -> Result<RelationshipNode, ResolveError> {
        let artifact = self.cache.get(Layer::Guidance, id)?;
        let Some(guidance) = artifact.as_deref().and_then(Artifact::as_guidance) else {
            return Err(not_found(Layer::Guidance, id));
        };

        let all = self.cache.all(Layer::Controls)?;
        let mut referenced_by = Vec::new();
        for catalog in catalogs(&all) {
            for (_, control) in catalog.controls() {
                for _ in control.guideline_mappings.iter().filter(|m| m.reference_id == id) {
                    referenced_by.push(ReferenceEdge {
                        source_id: control.id.clone(),
                        source_layer: Layer::Controls,
                        target_id: id.to_string(),
                        target_layer: Layer::Guidance,
                        resolved: true,
                        context: Some(catalog.metadata.id.clone()),
                    });
                }
            }
        }

        let meta = &guidance.metadata;
        Ok(RelationshipNode {
            id: id.to_string(),
            layer: Layer::Guidance,
            title: meta.title.clone(),
            references: Vec::new(),
            referenced_by,
            details: NodeDetails::Guidance {
                author: meta.author.clone(),
                version: meta.version.clone(),
                document_type: meta.document_type.clone(),
                guideline_count: guidance.guideline_count(),
            },
        })
    }

    fn resolve_control(&self, id: &str) -> Result<RelationshipNode, ResolveError> {
        let all = self.cache.all(Layer::Controls)?;
        let Some(hit) = find_control(catalogs(&all), id) else {
            return Err(not_found(Layer::Controls, id));
        };
        let catalog_id = &hit.catalog.metadata.id;

        let references = hit
            .control
            .guideline_mappings
            .iter()
            .filter(|m| !m.reference_id.is_empty())
            .map(|m| ReferenceEdge {
                source_id: id.to_string(),
                source_layer: Layer::Controls,
                target_id: m.reference_id.clone(),
                target_layer: Layer::Guidance,
                resolved: self.guidance_exists(&m.reference_id),
                context: Some(catalog_id.clone()),
            })
            .collect();

        let all_policies = self.cache.all(Layer::Policy)?;
        let mut referenced_by = Vec::new();
        for policy in policies(&all_policies) {
            for _ in policy.control_references.iter().filter(|r| r.reference_id == id) {
                referenced_by.push(ReferenceEdge {
                    source_id: policy.metadata.id.clone(),
                    source_layer: Layer::Policy,
                    target_id: id.to_string(),
                    target_layer: Layer::Controls,
                    resolved: true,
                    context: Some(catalog_id.clone()),
                });
            }
        }

        Ok(RelationshipNode {
            id: id.to_string(),
            layer: Layer::Controls,
            title: hit.control.title.clone(),
            references,
            referenced_by,
            details: NodeDetails::Control {
                catalog_id: catalog_id.clone(),
                family_id: hit.family.id.clone(),
                objective: hit.control.objective.clone(),
            },
        })
    }

    fn resolve_policy(&self, id: &str) -> Result<RelationshipNode, ResolveError> {
        let artifact = self.cache.get(Layer::Policy, id)?;
        let Some(policy) = artifact.as_deref().and_then(Artifact::as_policy) else {
            return Err(not_found(Layer::Policy, id));
        };

        let mut references: Vec<ReferenceEdge> = policy
            .guidance_references
            .iter()
            .filter(|r| !r.reference_id.is_empty())
            .map(|r| ReferenceEdge {
                source_id: id.to_string(),
                source_layer: Layer::Policy,
                target_id: r.reference_id.clone(),
                target_layer: Layer::Guidance,
                resolved: self.guidance_exists(&r.reference_id),
                context: None,
            })
            .collect();

        let all = self.cache.all(Layer::Controls)?;
        for r in policy.control_references.iter().filter(|r| !r.reference_id.is_empty()) {
            let hit = find_control(catalogs(&all), &r.reference_id);
            references.push(ReferenceEdge {
                source_id: id.to_string(),
                source_layer: Layer::Policy,
                target_id: r.reference_id.clone(),
                target_layer: Layer::Controls,
                resolved: hit.is_some(),
                context: hit.map(|h| h.catalog.metadata.id.clone()),
            });
        }

        let meta = &policy.metadata;
        Ok(RelationshipNode {
            id: id.to_string(),
            layer: Layer::Policy,
            title: meta.title.clone(),
            references,
            referenced_by: Vec::new(),
            details: NodeDetails::Policy {
                organization: meta.organization_id.clone(),
                version: meta.version.clone(),
                objective: meta.objective.clone(),
            },
        })
    }

    /// Unreadable guidance counts as absent so resolution stays total.
    fn guidance_exists(&self, id: &str) -> bool {
        match self.cache.get(Layer::Guidance, id) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(id, error = %e, "guidance unreadable, marking reference unresolved");
                false
            }
        }
    }
}

fn not_found(layer: Layer, id: &str) -> ResolveError {
    ResolveError::NotFound {
        layer,
        id: id.to_string(),
    }
}
