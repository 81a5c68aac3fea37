//! # Bundle Subcommand
//!
//! `a2ui bundle <input> [-o <output>]` writes a self-contained copy of a
//! schema file with every remote `$ref` inlined under `$defs`. The default
//! output is `<input dir>/dist/<input file name>`.

use std::path::PathBuf;

use a2ui_schema::SchemaBundler;
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the bundle subcommand.
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Schema file to bundle.
    pub input: PathBuf,

    /// Output file. Defaults to `dist/<name>` next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the bundle subcommand.
pub fn run_bundle(args: &BundleArgs) -> Result<u8> {
    let written = SchemaBundler::new()
        .bundle_to_file(&args.input, args.output.as_deref())
        .with_context(|| format!("failed to bundle {}", args.input.display()))?;
    println!("{}", written.display());
    Ok(0)
}
