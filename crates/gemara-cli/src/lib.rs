//! # gemara-cli — Gemara Artifact Store Command-Line Interface
//!
//! Validates, stores and inspects Gemara layer artifacts.
//!
//! ## Subcommands
//!
//! - `validate`: schema validation of a document against a layer
//! - `store`, `load`, `list`, `get`: artifact storage
//! - `search`, `controls`, `mappings`, `relationships`, `applicable`: queries
//! - `schema`: schema text and summaries
//! - `index`: index rebuild and verification
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `XxxArgs` structs; handlers are `run_xxx`
//!   functions returning an exit code.
//! - Handlers delegate to the library crates through [`context::AppContext`].
//! - Exit codes: [`EXIT_OK`], [`EXIT_ERROR`], [`EXIT_VALIDATION_FAILED`].

pub mod artifact;
pub mod config;
pub mod context;
pub mod index;
pub mod output;
pub mod query;
pub mod schema;
pub mod validate;

pub const EXIT_OK: u8 = 0;
/// Operational failure (I/O, fetch, missing artifact).
pub const EXIT_ERROR: u8 = 1;
/// The input was rejected: failed validation, or an inconsistent index.
pub const EXIT_VALIDATION_FAILED: u8 = 2;
