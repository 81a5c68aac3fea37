//! # Validate Subcommand
//!
//! `a2ui validate [--fix] <payload>` checks generated output against a
//! catalog. With `--fix` the payload goes through the trailing-comma repair
//! step and the repaired message list is printed.

use std::path::{Path, PathBuf};

use a2ui_schema::{parse_messages, PayloadError};
use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::{emit_json, load_catalog, read_input, SpecArgs, EXIT_INVALID};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Payload file, or `-` for stdin.
    pub payload: PathBuf,

    /// Repair trailing commas once before giving up, and print the result.
    #[arg(long)]
    pub fix: bool,

    /// Write the repaired payload here instead of stdout (with `--fix`).
    #[arg(short, long, requires = "fix")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub spec: SpecArgs,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let (_, catalog) = load_catalog(config, &args.spec)?;
    let raw = read_input(&args.payload)?;

    let outcome = if args.fix {
        catalog
            .payload_fixer()?
            .validate_and_fix(&raw)
            .map(Some)
    } else {
        let validator = catalog.validator()?;
        parse_messages(&raw).and_then(|messages| {
            validator
                .validate(&Value::Array(messages))
                .map(|()| None)
                .map_err(PayloadError::from)
        })
    };

    match outcome {
        Ok(repaired) => {
            tracing::info!(
                payload = %args.payload.display(),
                catalog = %catalog.name(),
                "payload is valid"
            );
            match repaired {
                Some(messages) => emit_json(&Value::Array(messages), args.output.as_deref())?,
                None => println!("OK"),
            }
            Ok(0)
        }
        Err(e) => {
            println!("{e}");
            Ok(EXIT_INVALID)
        }
    }
}
