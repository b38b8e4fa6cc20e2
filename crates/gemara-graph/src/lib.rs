//! # gemara-graph — Cross-Layer Relationships
//!
//! Read-only views over the artifacts held by an
//! [`ArtifactCache`](gemara_store::ArtifactCache):
//!
//! - [`RelationshipResolver`] turns an artifact into a [`RelationshipNode`]
//!   with outbound `references` and inbound `referenced_by` edges. Missing
//!   targets become unresolved [`ReferenceEdge`]s rather than errors.
//! - [`CatalogQueries`] answers search, control listing, guideline mapping
//!   and applicability questions with typed result structs.
//!
//! Edges are derived on every call by scanning catalogs, families,
//! controls and mappings. No reverse index is kept.

pub mod edge;
pub mod error;
pub mod query;
pub mod resolver;

pub use edge::{NodeDetails, ReferenceEdge, RelationshipNode, RelationshipSummary};
pub use error::ResolveError;
pub use query::{
    ApplicableArtifacts, CatalogQueries, ControlSummary, GuidanceMatch, GuidanceSummary,
    GuidelineMappingReport, MappingReport, PolicyMatch,
};
pub use resolver::RelationshipResolver;
