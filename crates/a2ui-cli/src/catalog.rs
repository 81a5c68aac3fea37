//! # Catalog Subcommand
//!
//! Offline catalog operations:
//!
//! - `a2ui catalog resolve --base <file> <custom>`: merge a custom catalog
//!   with the catalog it references.
//! - `a2ui catalog prune --allow Text,Card <catalog>`: restrict a catalog
//!   document to the named components.
//! - `a2ui catalog render`: print the schema block handed to a generator,
//!   optionally followed by the catalog's examples.

use std::path::{Path, PathBuf};

use a2ui_schema::{prune_catalog_schema, resolve_catalog_schema};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::{emit, emit_json, load_catalog, read_json, SpecArgs};

/// Catalog subcommand arguments.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

/// Available catalog subcommands.
#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Resolve the `$ref`s of a custom catalog against a base catalog.
    Resolve {
        /// Base catalog document.
        #[arg(long)]
        base: PathBuf,

        /// Custom catalog document.
        custom: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep only the allowed components of a catalog document.
    Prune {
        /// Catalog document.
        catalog: PathBuf,

        /// Component names to keep (comma separated).
        #[arg(long, value_delimiter = ',', required = true)]
        allow: Vec<String>,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the schema instructions for a catalog.
    Render {
        #[command(flatten)]
        spec: SpecArgs,

        /// Append the catalog's examples.
        #[arg(long)]
        examples: bool,

        /// Skip examples that do not validate (with `--examples`).
        #[arg(long, requires = "examples")]
        validate_examples: bool,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute the catalog subcommand.
pub fn run_catalog(args: &CatalogArgs, config: Option<&Path>) -> Result<u8> {
    match &args.command {
        CatalogCommand::Resolve { base, custom, output } => {
            let resolved = resolve_catalog_schema(&read_json(base)?, &read_json(custom)?);
            emit_json(&resolved, output.as_deref())?;
            Ok(0)
        }
        CatalogCommand::Prune { catalog, allow, output } => {
            let document = read_json(catalog)?;
            if !document.is_object() {
                bail!("{} is not a catalog document", catalog.display());
            }
            emit_json(&prune_catalog_schema(&document, allow), output.as_deref())?;
            Ok(0)
        }
        CatalogCommand::Render {
            spec,
            examples,
            validate_examples,
            output,
        } => {
            let (manager, catalog) = load_catalog(config, spec)?;
            let mut text = catalog.render_as_llm_instructions();
            if *examples {
                let loaded = manager.load_examples(&catalog, *validate_examples);
                if !loaded.is_empty() {
                    text.push_str("\n\n");
                    text.push_str(&loaded);
                }
            }
            emit(&text, output.as_deref())?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixture_spec_root;
    use serde_json::{json, Value};

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_resolve_merges_referenced_components() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        let custom = dir.path().join("custom.json");
        std::fs::write(
            &base,
            json!({ "catalogId": "https://example.com/base.json", "components": { "Text": {} } }).to_string(),
        )
        .unwrap();
        std::fs::write(
            &custom,
            json!({
                "catalogId": "https://example.com/custom.json",
                "components": { "$ref": "https://example.com/base.json#/components", "Map": {} }
            })
            .to_string(),
        )
        .unwrap();
        let output = dir.path().join("resolved.json");

        let args = CatalogArgs {
            command: CatalogCommand::Resolve {
                base,
                custom,
                output: Some(output.clone()),
            },
        };
        assert_eq!(run_catalog(&args, None).unwrap(), 0);
        let resolved: Value = serde_json::from_str(&read(&output)).unwrap();
        assert_eq!(resolved["components"], json!({ "Map": {}, "Text": {} }));
    }

    #[test]
    fn test_prune_keeps_allowed_components() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(
            &catalog,
            json!({
                "components": { "Text": {}, "Card": {} },
                "$defs": { "anyComponent": { "oneOf": [
                    { "$ref": "#/components/Text" }, { "$ref": "#/components/Card" }
                ] } }
            })
            .to_string(),
        )
        .unwrap();
        let output = dir.path().join("pruned.json");

        let args = CatalogArgs {
            command: CatalogCommand::Prune {
                catalog,
                allow: vec!["Card".into()],
                output: Some(output.clone()),
            },
        };
        assert_eq!(run_catalog(&args, None).unwrap(), 0);
        let pruned: Value = serde_json::from_str(&read(&output)).unwrap();
        assert_eq!(pruned["components"], json!({ "Card": {} }));
        assert_eq!(
            pruned["$defs"]["anyComponent"]["oneOf"],
            json!([{ "$ref": "#/components/Card" }])
        );
    }

    #[test]
    fn test_render_writes_schema_block() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("prompt.txt");
        let args = CatalogArgs {
            command: CatalogCommand::Render {
                spec: SpecArgs {
                    protocol_version: "0.9".into(),
                    spec_root: Some(fixture_spec_root()),
                    catalog_id: None,
                    allow: vec!["Text".into()],
                },
                examples: true,
                validate_examples: false,
                output: Some(output.clone()),
            },
        };
        assert_eq!(run_catalog(&args, None).unwrap(), 0);

        let text = read(&output);
        assert!(text.starts_with("---BEGIN A2UI JSON SCHEMA---\n\n### Server To Client Schema:\n"));
        assert!(text.contains("### Common Types Schema:"));
        assert!(text.trim_end().ends_with("---END A2UI JSON SCHEMA---"));
        assert!(!text.contains("\"Card\""));
    }
}
