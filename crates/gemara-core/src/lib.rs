//! # gemara-core — Foundational Types for Gemara Artifacts
//!
//! Defines the data model shared by every other crate in the workspace:
//! the compliance [`Layer`] hierarchy, the validated [`ArtifactId`], and the
//! typed document shapes for each storable layer.
//!
//! ## Layers
//!
//! | Layer | Artifact | Outbound references |
//! |-------|----------|---------------------|
//! | 1 | [`GuidanceDocument`] | none (terminal) |
//! | 2 | [`Catalog`] of control families and controls | guideline mappings → layer 1 |
//! | 3 | [`PolicyDocument`] | guidance references → layer 1, control references → layer 2 |
//! | 4 | evaluation plans | validated only, never stored |
//!
//! ## Crate Policy
//!
//! - No dependencies on other `gemara-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Typed documents are lenient on input: unknown fields are ignored and
//!   missing collections default to empty. Strictness lives in the schemas.

pub mod artifact;
pub mod catalog;
pub mod error;
pub mod guidance;
pub mod identity;
pub mod layer;
pub mod metadata;
pub mod policy;

// Re-export primary types for ergonomic imports.
pub use artifact::{Artifact, IndexEntry};
pub use catalog::{AssessmentRequirement, Catalog, Control, ControlFamily};
pub use error::GemaraError;
pub use guidance::{Category, Guideline, GuidanceDocument};
pub use identity::ArtifactId;
pub use layer::Layer;
pub use metadata::{Applicability, Mapping, MappingEntry, Metadata};
pub use policy::{PolicyDocument, PolicyRequirement};
