//! # Index Subcommands
//!
//! `index rebuild` regenerates `index.json` from the layer directories.
//! `index verify` compares the index with the content on disk and exits 2
//! when they disagree.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::output::{emit, OutputFormat};
use crate::{EXIT_OK, EXIT_VALIDATION_FAILED};

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Rebuild the index from stored content.
    Rebuild,
    /// Report index entries with missing or altered content.
    Verify,
}

pub fn run_index(args: &IndexArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let store = ctx.require_store()?;
    match args.command {
        IndexCommand::Rebuild => {
            let summary = store.rebuild_index()?;
            tracing::info!(base_dir = %store.base_dir().display(), indexed = summary.indexed, "index rebuilt");
            emit(&summary, format)?;
            Ok(EXIT_OK)
        }
        IndexCommand::Verify => {
            let problems = store.verify()?;
            emit(&problems, format)?;
            if problems.is_empty() {
                Ok(EXIT_OK)
            } else {
                tracing::warn!(problems = problems.len(), "index does not match stored content");
                Ok(EXIT_VALIDATION_FAILED)
            }
        }
    }
}
