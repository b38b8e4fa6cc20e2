//! # gemara CLI entry point
//!
//! Parses command-line arguments, builds the application context and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gemara_cli::artifact::{run_get, run_list, run_load, run_store, GetArgs, ListArgs, LoadArgs, StoreArgs};
use gemara_cli::config::{ConfigOverrides, GemaraConfig};
use gemara_cli::context::AppContext;
use gemara_cli::index::{run_index, IndexArgs};
use gemara_cli::output::OutputFormat;
use gemara_cli::query::{
    run_applicable, run_controls, run_mappings, run_relationships, run_search, ApplicableArgs,
    ControlsArgs, MappingsArgs, RelationshipsArgs, SearchArgs,
};
use gemara_cli::schema::{run_schema, SchemaArgs};
use gemara_cli::validate::{run_validate, ValidateArgs};
use gemara_cli::EXIT_ERROR;

/// Gemara artifact store.
///
/// Validates guidance, control catalogs, policies and evaluations against
/// the Gemara layer schemas, stores accepted documents on disk and answers
/// questions about how they reference each other.
#[derive(Parser, Debug)]
#[command(name = "gemara", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format for command results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml, global = true)]
    format: OutputFormat,

    /// Store root directory. Overrides GEMARA_ARTIFACTS_DIR.
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Read schemas from this directory. Overrides GEMARA_SCHEMA_DIR.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    /// Remote schema base URL. Overrides GEMARA_SCHEMA_URL.
    #[arg(long, global = true)]
    schema_url: Option<String>,

    /// Run without the on-disk store; the artifacts directory is only read.
    #[arg(long, global = true)]
    no_store: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document against a layer schema.
    Validate(ValidateArgs),
    /// Validate a document and store it verbatim.
    Store(StoreArgs),
    /// Parse a document into the cache and persist it.
    Load(LoadArgs),
    /// List stored artifacts of a layer.
    List(ListArgs),
    /// Print one artifact.
    Get(GetArgs),
    /// Search guidance, controls or policies.
    Search(SearchArgs),
    /// List controls across all catalogs.
    Controls(ControlsArgs),
    /// Show the guideline mappings of a control.
    Mappings(MappingsArgs),
    /// Show what an artifact references and what references it.
    Relationships(RelationshipsArgs),
    /// Find guidance and controls in scope for boundaries, technologies or providers.
    Applicable(ApplicableArgs),
    /// Show schema text or a layer schema summary.
    Schema(SchemaArgs),
    /// Rebuild or verify the store index.
    Index(IndexArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("gemara CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = GemaraConfig::from_env()?.with_overrides(ConfigOverrides {
        artifacts_dir: cli.artifacts_dir,
        schema_dir: cli.schema_dir,
        schema_url: cli.schema_url,
        no_store: cli.no_store,
    })?;
    tracing::debug!(
        artifacts_dir = %config.artifacts_dir.display(),
        schema = ?config.schema_origin(),
        store = config.use_store,
        "resolved configuration"
    );
    let ctx = AppContext::new(config)?;
    let format = cli.format;

    match cli.command {
        Commands::Validate(args) => run_validate(&args, &ctx, format).await,
        Commands::Store(args) => run_store(&args, &ctx, format).await,
        Commands::Load(args) => run_load(&args, &ctx, format),
        Commands::List(args) => run_list(&args, &ctx, format),
        Commands::Get(args) => run_get(&args, &ctx, format),
        Commands::Search(args) => run_search(&args, &ctx, format),
        Commands::Controls(args) => run_controls(&args, &ctx, format),
        Commands::Mappings(args) => run_mappings(&args, &ctx, format),
        Commands::Relationships(args) => run_relationships(&args, &ctx, format),
        Commands::Applicable(args) => run_applicable(&args, &ctx, format),
        Commands::Schema(args) => run_schema(&args, &ctx, format).await,
        Commands::Index(args) => run_index(&args, &ctx, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemara_cli::index::IndexCommand;
    use gemara_cli::schema::SchemaCommand;
    use gemara_core::Layer;

    #[test]
    fn cli_parse_validate_with_layer() {
        let cli = Cli::try_parse_from(["gemara", "validate", "catalog.yaml", "--layer", "2"]).unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("catalog.yaml"));
            assert_eq!(args.layer, Layer::Controls);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_layer_spellings() {
        for spelling in ["1", "layer-1", "guidance"] {
            let cli = Cli::try_parse_from(["gemara", "list", "--layer", spelling]).unwrap();
            match cli.command {
                Commands::List(args) => assert_eq!(args.layer, Layer::Guidance),
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn cli_parse_rejects_unknown_layer() {
        assert!(Cli::try_parse_from(["gemara", "list", "--layer", "7"]).is_err());
    }

    #[test]
    fn cli_parse_validate_requires_layer() {
        assert!(Cli::try_parse_from(["gemara", "validate", "doc.yaml"]).is_err());
    }

    #[test]
    fn cli_parse_get_raw() {
        let cli = Cli::try_parse_from(["gemara", "get", "nist-csf", "--layer", "1", "--raw"]).unwrap();
        if let Commands::Get(args) = cli.command {
            assert_eq!(args.id, "nist-csf");
            assert!(args.raw);
        } else {
            panic!("expected get");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gemara",
            "list",
            "--layer",
            "3",
            "-vv",
            "--format",
            "json",
            "--artifacts-dir",
            "/tmp/store",
            "--no-store",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.artifacts_dir, Some(PathBuf::from("/tmp/store")));
        assert!(cli.no_store);
        assert!(!cli.log_json);
    }

    #[test]
    fn cli_parse_search_with_technology() {
        let cli = Cli::try_parse_from([
            "gemara",
            "search",
            "access",
            "--layer",
            "2",
            "--technology",
            "kubernetes",
        ])
        .unwrap();
        if let Commands::Search(args) = cli.command {
            assert_eq!(args.term, "access");
            assert_eq!(args.technology.as_deref(), Some("kubernetes"));
        } else {
            panic!("expected search");
        }
    }

    #[test]
    fn cli_parse_controls_filter() {
        let cli = Cli::try_parse_from(["gemara", "controls", "--layer1-reference", "nist-csf"]).unwrap();
        if let Commands::Controls(args) = cli.command {
            assert_eq!(args.layer1_reference.as_deref(), Some("nist-csf"));
        } else {
            panic!("expected controls");
        }
    }

    #[test]
    fn cli_parse_mappings_details() {
        let cli = Cli::try_parse_from(["gemara", "mappings", "k8s-rbac", "--details"]).unwrap();
        if let Commands::Mappings(args) = cli.command {
            assert_eq!(args.control_id, "k8s-rbac");
            assert!(args.details);
        } else {
            panic!("expected mappings");
        }
    }

    #[test]
    fn cli_parse_applicable_repeated_filters() {
        let cli = Cli::try_parse_from([
            "gemara",
            "applicable",
            "--boundary",
            "EU",
            "--boundary",
            "US",
            "--provider",
            "aws",
        ])
        .unwrap();
        if let Commands::Applicable(args) = cli.command {
            assert_eq!(args.boundaries, vec!["EU".to_string(), "US".to_string()]);
            assert!(args.technologies.is_empty());
            assert_eq!(args.providers, vec!["aws".to_string()]);
        } else {
            panic!("expected applicable");
        }
    }

    #[test]
    fn cli_parse_schema_subcommands() {
        let cli = Cli::try_parse_from(["gemara", "schema", "show", "layer-2"]).unwrap();
        match cli.command {
            Commands::Schema(SchemaArgs {
                command: SchemaCommand::Show { name },
            }) => assert_eq!(name, "layer-2"),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["gemara", "schema", "info", "--layer", "4"]).unwrap();
        match cli.command {
            Commands::Schema(SchemaArgs {
                command: SchemaCommand::Info { layer },
            }) => assert_eq!(layer, Layer::Evaluation),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_index_subcommands() {
        let cli = Cli::try_parse_from(["gemara", "index", "verify"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Index(IndexArgs {
                command: IndexCommand::Verify
            })
        ));
        let cli = Cli::try_parse_from(["gemara", "index", "rebuild"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Index(IndexArgs {
                command: IndexCommand::Rebuild
            })
        ));
    }

    #[test]
    fn cli_default_format_is_yaml() {
        let cli = Cli::try_parse_from(["gemara", "index", "rebuild"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Yaml);
        assert_eq!(cli.verbose, 0);
    }
}
