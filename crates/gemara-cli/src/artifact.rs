//! # Artifact Subcommands
//!
//! `store`, `load`, `list` and `get`.
//!
//! ```bash
//! gemara store guidance.yaml --layer 1
//! gemara load catalog.json --layer 2
//! gemara list --layer 2
//! gemara get nist-csf --layer 1 --raw
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use gemara_core::{Artifact, IndexEntry, Layer};
use gemara_store::load_file;
use serde::Serialize;

use crate::context::{AppContext, StoreOutcome};
use crate::output::{emit, render, OutputFormat};
use crate::{EXIT_OK, EXIT_VALIDATION_FAILED};

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Document to validate and store verbatim.
    pub file: PathBuf,

    /// Layer of the document (1-3).
    #[arg(long)]
    pub layer: Layer,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// YAML or JSON document to parse into the typed model.
    pub file: PathBuf,

    /// Layer of the document (1-3).
    #[arg(long)]
    pub layer: Layer,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub layer: Layer,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Artifact id (catalog id for layer 2).
    pub id: String,

    #[arg(long)]
    pub layer: Layer,

    /// Print the stored text exactly as submitted.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Serialize)]
struct Stored<'a> {
    id: &'a str,
    layer: Layer,
    stored: bool,
}

#[derive(Debug, Serialize)]
struct Loaded<'a> {
    id: &'a str,
    layer: Layer,
    title: &'a str,
    persisted: bool,
}

/// Validate, then store. An invalid document prints its report and exits 2.
pub async fn run_store(args: &StoreArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    match ctx.store_document(args.layer, &content).await? {
        StoreOutcome::Stored { id, .. } => {
            emit(
                &Stored {
                    id: id.as_str(),
                    layer: args.layer,
                    stored: true,
                },
                format,
            )?;
            Ok(EXIT_OK)
        }
        StoreOutcome::Rejected(report) => {
            emit(&report, format)?;
            Ok(EXIT_VALIDATION_FAILED)
        }
    }
}

pub fn run_load(args: &LoadArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let artifact = load_file(ctx.cache(), args.layer, &args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let persisted = ctx
        .store()
        .is_some_and(|s| s.contains(args.layer, artifact.id()));
    emit(
        &Loaded {
            id: artifact.id(),
            layer: args.layer,
            title: artifact.title(),
            persisted,
        },
        format,
    )?;
    Ok(EXIT_OK)
}

pub fn run_list(args: &ListArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let entries = list_entries(ctx, args.layer)?;
    emit(&entries, format)?;
    Ok(EXIT_OK)
}

/// Index entries from the store, or from the cache when running cache-only.
pub fn list_entries(ctx: &AppContext, layer: Layer) -> Result<Vec<IndexEntry>> {
    if let Some(store) = ctx.store() {
        return Ok(store.list(layer)?);
    }
    let mut entries = Vec::new();
    for artifact in ctx.cache().all(layer)? {
        entries.push(artifact.index_entry()?);
    }
    Ok(entries)
}

pub fn run_get(args: &GetArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    if args.raw {
        let text = ctx.require_store()?.retrieve_raw(args.layer, &args.id)?;
        print!("{text}");
        return Ok(EXIT_OK);
    }
    let Some(artifact) = ctx.cache().get(args.layer, &args.id)? else {
        bail!("{} artifact '{}' not found", args.layer, args.id);
    };
    print!("{}", render_artifact(&artifact, format)?);
    Ok(EXIT_OK)
}

fn render_artifact(artifact: &Artifact, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(artifact.to_yaml()?),
        OutputFormat::Json => match artifact {
            Artifact::Guidance(doc) => render(doc, format),
            Artifact::Catalog(cat) => render(cat, format),
            Artifact::Policy(pol) => render(pol, format),
        },
    }
}
