//! # a2ui CLI entry point
//!
//! Parses command-line arguments, installs logging and dispatches to the
//! subcommand handlers in `a2ui_cli`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use a2ui_cli::bundle::{run_bundle, BundleArgs};
use a2ui_cli::catalog::{run_catalog, CatalogArgs};
use a2ui_cli::validate::{run_validate, ValidateArgs};

/// Exit code for operational failures (unreadable files, bad config).
const EXIT_ERROR: u8 = 2;

/// A2UI catalog tooling.
///
/// Bundles schema files, validates and repairs generated payloads, and
/// resolves, prunes and renders component catalogs.
#[derive(Parser, Debug)]
#[command(name = "a2ui", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Agent configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inline the remote `$ref`s of a schema file into `$defs`.
    Bundle(BundleArgs),

    /// Validate a generated payload against a catalog.
    Validate(ValidateArgs),

    /// Resolve, prune or render catalogs.
    Catalog(CatalogArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Bundle(args) => run_bundle(args),
        Commands::Validate(args) => run_validate(args, config),
        Commands::Catalog(args) => run_catalog(args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
