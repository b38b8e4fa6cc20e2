//! # gemara-schema — Schema Retrieval and Validation
//!
//! Decides whether a candidate document is an acceptable artifact of a
//! given layer before anything is stored.
//!
//! ## Flow
//!
//! 1. [`SchemaSource`] fetches the shared fragments (`base`, `metadata`,
//!    `mapping`) and the layer schema, from a remote base URL or a local
//!    directory, memoizing each by [`SchemaName`].
//! 2. [`compose`] merges the fragments' `$defs` into the layer schema.
//! 3. [`Validator`] parses the document and reports a [`ValidationReport`]
//!    whose [`FailureClass`] separates structural (unification) problems
//!    from missing required fields (concreteness).
//!
//! [`suggest`] attaches authoring hints to failed reports, [`info`]
//! summarises a layer schema, and [`pipeline`] orchestrates external
//! ingestion stages that end in a layer 1 validation.
//!
//! ## Crate Policy
//!
//! - Depends only on `gemara-core` internally.
//! - Validation is pure: it never reads or writes artifact storage.
//! - A failed validation is a report, not an `Err`.

pub mod compose;
pub mod error;
pub mod info;
pub mod pipeline;
pub mod source;
pub mod suggest;
pub mod validate;

pub use compose::compose;
pub use error::{SchemaError, SchemaFetchError};
pub use info::SchemaInfo;
pub use pipeline::{IngestPipeline, IngestReport, PipelineError};
pub use source::{SchemaName, SchemaOrigin, SchemaSource};
pub use suggest::Suggestion;
pub use validate::{Diagnostic, FailureClass, ValidationReport, Validator};
