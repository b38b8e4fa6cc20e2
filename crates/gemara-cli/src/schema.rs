//! # Schema Subcommands
//!
//! ```bash
//! gemara schema show layer-2
//! gemara schema info --layer 1
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use gemara_core::Layer;
use gemara_schema::SchemaName;

use crate::context::AppContext;
use crate::output::{emit, OutputFormat};
use crate::EXIT_OK;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommand,
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Print a schema fragment as served by the origin.
    Show {
        /// base, metadata, mapping, or layer-1 .. layer-4.
        name: String,
    },
    /// Summarise what a layer schema requires.
    Info {
        #[arg(long)]
        layer: Layer,
    },
}

pub async fn run_schema(args: &SchemaArgs, ctx: &AppContext, format: OutputFormat) -> Result<u8> {
    match &args.command {
        SchemaCommand::Show { name } => {
            let schema = SchemaName::parse(name).ok_or_else(|| {
                anyhow!("unknown schema '{name}' (expected base, metadata, mapping or layer-N)")
            })?;
            let text = ctx
                .validator()
                .source()
                .fetch(schema)
                .await
                .with_context(|| format!("failed to fetch schema {schema}"))?;
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
        SchemaCommand::Info { layer } => {
            let info = ctx.validator().schema_info(*layer).await?;
            emit(&info, format)?;
        }
    }
    Ok(EXIT_OK)
}
