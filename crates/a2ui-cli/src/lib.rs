//! # a2ui-cli — Command-Line Tooling for A2UI Catalogs
//!
//! Provides the `a2ui` binary on top of `a2ui-schema`.
//!
//! ## Subcommands
//!
//! - `a2ui bundle` — Inline the remote `$ref`s of a schema file.
//! - `a2ui validate` — Validate (and optionally repair) a generated payload.
//! - `a2ui catalog` — Resolve, prune or render catalogs.
//!
//! ```bash
//! a2ui bundle specification/v0_9/json/basic_catalog.json
//! a2ui validate --protocol 0.9 --fix response.json
//! a2ui --config agent.yaml catalog render --allow Text,Card
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing and logging setup live here; handlers delegate to
//!   `a2ui-schema` for all behavior.
//! - Handlers return an exit code: `0` success, `1` the input failed
//!   validation. Operational failures are returned as errors and exit with
//!   `2`.

pub mod bundle;
pub mod catalog;
pub mod validate;

use std::io::Write;
use std::path::{Path, PathBuf};

use a2ui_core::ProtocolVersion;
use a2ui_schema::{Catalog, SchemaManager, SchemaManagerConfig};
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

/// Exit code for input that was read successfully but failed validation.
pub const EXIT_INVALID: u8 = 1;

/// Where the specification documents and catalogs come from. With
/// `--config`, the YAML file replaces `--protocol`.
#[derive(Args, Debug, Clone, Default)]
pub struct SpecArgs {
    /// Protocol version (`0.8` or `0.9`).
    #[arg(long = "protocol", value_name = "VERSION", default_value = "0.9")]
    pub protocol_version: String,

    /// Directory containing `specification/`. Discovered from the
    /// working directory upwards when omitted.
    #[arg(long)]
    pub spec_root: Option<PathBuf>,

    /// Catalog id to use instead of the basic catalog.
    #[arg(long)]
    pub catalog_id: Option<String>,

    /// Restrict the catalog to these component names (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,
}

/// Build the manager configuration from `--config` or the discrete flags.
pub fn manager_config(config: Option<&Path>, spec: &SpecArgs) -> Result<SchemaManagerConfig> {
    if let Some(path) = config {
        let mut loaded = SchemaManagerConfig::from_yaml_file(path)?;
        if spec.spec_root.is_some() {
            loaded.spec_root = spec.spec_root.clone();
        }
        return Ok(loaded);
    }
    let version: ProtocolVersion = spec.protocol_version.parse()?;
    let mut built = SchemaManagerConfig::new(version);
    built.spec_root = spec.spec_root.clone();
    Ok(built)
}

/// Load the manager and pick the catalog named by `--catalog-id` (or the
/// basic catalog), pruned to `--allow`.
pub fn load_catalog(config: Option<&Path>, spec: &SpecArgs) -> Result<(SchemaManager, Catalog)> {
    let manager = SchemaManager::load(&manager_config(config, spec)?)
        .context("failed to load specification documents")?;
    let catalog = match &spec.catalog_id {
        Some(id) => manager
            .catalog(id)
            .cloned()
            .with_context(|| {
                format!(
                    "unknown catalog id '{id}'; known ids: {}",
                    manager.supported_catalog_ids().join(", ")
                )
            })?,
        None => manager.basic_catalog().clone(),
    };
    let catalog = catalog.with_pruned_components(spec.allow.as_slice());
    tracing::debug!(catalog = %catalog.name(), version = %manager.version(), "selected catalog");
    Ok((manager, catalog))
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read and parse a JSON document.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Write `text` to `output`, or to stdout when `output` is `None`.
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").context("failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Pretty-print `value` to `output` or stdout.
pub fn emit_json(value: &Value, output: Option<&Path>) -> Result<()> {
    emit(&serde_json::to_string_pretty(value)?, output)
}
