//! # gemara-store — Artifact Persistence
//!
//! Keeps layer 1–3 documents on disk, exactly as submitted, behind a
//! persisted index.
//!
//! - [`ArtifactStore`] writes content then index, lists and retrieves
//!   through the index, and can [`verify`](ArtifactStore::verify) or
//!   [`rebuild`](ArtifactStore::rebuild_index) it.
//! - [`ArtifactCache`] memoizes parsed artifacts per layer, filling from
//!   the store on a miss.
//! - [`load_artifacts_dir`] and [`load_file`] bring documents in from
//!   outside the store.
//!
//! ## Crate Policy
//!
//! - Depends only on `gemara-core` internally.
//! - Nothing here validates against schemas. Callers gate writes.
//! - Synchronous filesystem I/O; locks are `parking_lot` and never held
//!   across an `.await`.

pub mod cache;
pub mod error;
pub mod index;
pub mod loader;
pub mod store;

pub use cache::ArtifactCache;
pub use error::StoreError;
pub use index::{ArtifactIndex, IndexRecord};
pub use loader::{load_artifacts_dir, load_file, LoadSummary};
pub use store::{ArtifactStore, IndexProblem, RebuildSummary, INDEX_FILE};
