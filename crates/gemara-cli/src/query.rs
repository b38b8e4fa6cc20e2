//! # Query Subcommands
//!
//! Read-only views over the cached artifacts: `search`, `controls`,
//! `mappings`, `relationships` and `applicable`.

use anyhow::{bail, Result};
use clap::Args;
use gemara_core::Layer;

use crate::context::AppContext;
use crate::output::{emit, OutputFormat};
use crate::EXIT_OK;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive substring to look for.
    pub term: String,

    /// 1 searches guidance, 2 controls, 3 policies.
    #[arg(long)]
    pub layer: Layer,

    /// Restrict control matches to an applicability term (layer 2 only).
    #[arg(long)]
    pub technology: Option<String>,
}

#[derive(Args, Debug)]
pub struct ControlsArgs {
    /// Only controls with a guideline mapping to this guidance id.
    #[arg(long = "layer1-reference")]
    pub layer1_reference: Option<String>,
}

#[derive(Args, Debug)]
pub struct MappingsArgs {
    pub control_id: String,

    /// Include title, version and author of each referenced guidance document.
    #[arg(long)]
    pub details: bool,
}

#[derive(Args, Debug)]
pub struct RelationshipsArgs {
    /// Guidance id, control id (layer 2) or policy id.
    pub id: String,

    #[arg(long)]
    pub layer: Layer,
}

#[derive(Args, Debug)]
pub struct ApplicableArgs {
    /// Jurisdiction or boundary term. Repeatable.
    #[arg(long = "boundary")]
    pub boundaries: Vec<String>,

    /// Technology term. Repeatable.
    #[arg(long = "technology")]
    pub technologies: Vec<String>,

    /// Provider term. Repeatable.
    #[arg(long = "provider")]
    pub providers: Vec<String>,
}

pub fn run_search(args: &SearchArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let queries = ctx.queries();
    if args.technology.is_some() && args.layer != Layer::Controls {
        tracing::warn!(layer = %args.layer, "--technology only applies to layer 2 searches");
    }
    match args.layer {
        Layer::Guidance => emit(&queries.search_guidance(&args.term)?, format)?,
        Layer::Controls => emit(
            &queries.search_controls(&args.term, args.technology.as_deref())?,
            format,
        )?,
        Layer::Policy => emit(&queries.search_policies(&args.term)?, format)?,
        Layer::Evaluation => bail!("search is not supported for {}", args.layer),
    }
    Ok(EXIT_OK)
}

pub fn run_controls(args: &ControlsArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let controls = ctx.queries().list_controls(args.layer1_reference.as_deref())?;
    tracing::info!(count = controls.len(), "listed controls");
    emit(&controls, format)?;
    Ok(EXIT_OK)
}

pub fn run_mappings(args: &MappingsArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let report = ctx.queries().guideline_mappings(&args.control_id, args.details)?;
    emit(&report, format)?;
    Ok(EXIT_OK)
}

pub fn run_relationships(args: &RelationshipsArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let node = ctx.resolver().resolve(&args.id, args.layer)?;
    let dangling = node.dangling().count();
    if dangling > 0 {
        tracing::info!(id = %args.id, dangling, "artifact has unresolved references");
    }
    emit(&node.summary(), format)?;
    Ok(EXIT_OK)
}

pub fn run_applicable(args: &ApplicableArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    if args.boundaries.is_empty() && args.technologies.is_empty() && args.providers.is_empty() {
        bail!("at least one of --boundary, --technology or --provider is required");
    }
    let found = ctx
        .queries()
        .find_applicable(&args.boundaries, &args.technologies, &args.providers)?;
    emit(&found, format)?;
    Ok(EXIT_OK)
}
