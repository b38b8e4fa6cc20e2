//! # Validate Subcommand
//!
//! Checks a document against its layer schema without storing it.
//!
//! ```bash
//! gemara validate catalog.yaml --layer 2
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gemara_core::Layer;

use crate::context::AppContext;
use crate::output::{emit, OutputFormat};
use crate::{EXIT_OK, EXIT_VALIDATION_FAILED};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML or JSON document to validate.
    pub file: PathBuf,

    /// Layer to validate against (1-4).
    #[arg(long)]
    pub layer: Layer,
}

/// Print the validation report. Exits with 2 when the document is invalid.
pub async fn run_validate(args: &ValidateArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let report = ctx
        .validator()
        .validate(&content, args.layer)
        .await
        .context("validation could not run")?;
    emit(&report, format)?;
    Ok(if report.valid { EXIT_OK } else { EXIT_VALIDATION_FAILED })
}
