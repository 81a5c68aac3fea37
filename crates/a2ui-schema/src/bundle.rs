//! # Schema Bundler
//!
//! Inlines every remote `$ref` of a schema file into a local `$defs`
//! section, producing one self-contained document.
//!
//! ## Design
//!
//! All per-run state (file cache, alias registry, collected definitions)
//! lives in a [`BundleContext`] created by [`SchemaBundler::bundle`] and
//! dropped when the run ends. Runs never share state.
//!
//! - A target is identified by `canonical path + "#" + fragment`.
//! - Its alias is registered *before* the target is walked, so a reference
//!   cycle comes back to an alias that already exists and terminates.
//! - Files are read at most once per run.
//! - Local refs (`#...`) are left as written.
//!
//! Any missing file or unresolvable fragment aborts the run. Nothing is
//! written in that case.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use a2ui_core::{resolve_pointer, split_reference, DEFS_KEY, REF_KEY};
use serde_json::{Map, Value};

use crate::error::BundleError;

/// Per-run bundling state.
#[derive(Debug, Default)]
pub struct BundleContext {
    /// Canonical file path → parsed document.
    file_cache: HashMap<PathBuf, Value>,
    /// Identity key → alias under `$defs`.
    aliases: HashMap<String, String>,
    used_aliases: HashSet<String>,
    /// Bundled definitions in completion order.
    definitions: Map<String, Value>,
}

impl BundleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aliases assigned so far, keyed by `path#fragment`.
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    pub fn cached_files(&self) -> usize {
        self.file_cache.len()
    }

    fn load(&mut self, path: &Path) -> Result<Value, BundleError> {
        if let Some(cached) = self.file_cache.get(path) {
            return Ok(cached.clone());
        }
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BundleError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                BundleError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let document: Value =
            serde_json::from_str(&text).map_err(|source| BundleError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;
        self.file_cache.insert(path.to_path_buf(), document.clone());
        Ok(document)
    }

    fn register_alias(&mut self, identity: String, file_stem: &str, fragment: &str) -> String {
        let cleaned = fragment.replace('/', "_").replace('#', "");
        let cleaned = cleaned.trim_start_matches('_');
        let cleaned = if cleaned.is_empty() { "root" } else { cleaned };

        let base = format!("{file_stem}_{cleaned}");
        let mut alias = base.clone();
        let mut counter = 1;
        while self.used_aliases.contains(&alias) {
            alias = format!("{base}_{counter}");
            counter += 1;
        }
        tracing::debug!(identity = %identity, alias = %alias, "registered bundle alias");
        self.used_aliases.insert(alias.clone());
        self.aliases.insert(identity, alias.clone());
        alias
    }

    fn process(&mut self, schema: Value, current_file: &Path) -> Result<Value, BundleError> {
        match schema {
            Value::Object(mut map) => {
                let remote = match map.get(REF_KEY) {
                    Some(Value::String(reference)) if !reference.starts_with('#') => {
                        Some(reference.clone())
                    }
                    _ => None,
                };
                if let Some(reference) = remote {
                    let rewritten = self.bundle_reference(&reference, current_file)?;
                    map.insert(REF_KEY.to_string(), Value::String(rewritten));
                }
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    let value = if key == REF_KEY {
                        value
                    } else {
                        self.process(value, current_file)?
                    };
                    out.insert(key, value);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.process(item, current_file))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    /// Bundle the target of a remote `reference` and return its local ref.
    fn bundle_reference(
        &mut self,
        reference: &str,
        current_file: &Path,
    ) -> Result<String, BundleError> {
        let (file_part, fragment) = split_reference(reference);
        let joined = current_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(file_part);
        let target_path = std::fs::canonicalize(&joined)
            .map_err(|_| BundleError::FileNotFound { path: joined.clone() })?;
        let identity = format!("{}#{fragment}", target_path.display());

        if let Some(alias) = self.aliases.get(&identity) {
            return Ok(local_ref(alias));
        }

        let document = self.load(&target_path)?;
        let target = resolve_pointer(&document, fragment)
            .map_err(|source| BundleError::UnresolvedPointer {
                reference: reference.to_string(),
                path: target_path.clone(),
                source,
            })?
            .clone();

        let stem = target_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let alias = self.register_alias(identity, &stem, fragment);

        let processed = self.process(target, &target_path)?;
        self.definitions.insert(alias.clone(), processed);
        Ok(local_ref(&alias))
    }
}

fn local_ref(alias: &str) -> String {
    format!("#/{DEFS_KEY}/{alias}")
}

/// Batch entry point for bundling schema files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaBundler;

impl SchemaBundler {
    pub fn new() -> Self {
        Self
    }

    /// Bundle `input` into a self-contained document. `$defs` (existing
    /// definitions, then bundled ones) comes first, followed by the other
    /// top-level keys in their original order.
    pub fn bundle(&self, input: &Path) -> Result<Value, BundleError> {
        let input = std::fs::canonicalize(input).map_err(|_| BundleError::FileNotFound {
            path: input.to_path_buf(),
        })?;
        let mut ctx = BundleContext::new();
        let root = ctx.load(&input)?;
        let processed = ctx.process(root, &input)?;

        let root_map = match processed {
            Value::Object(map) => map,
            other => return Ok(other),
        };

        let mut merged_defs = match root_map.get(DEFS_KEY) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        for (alias, definition) in std::mem::take(&mut ctx.definitions) {
            merged_defs.insert(alias, definition);
        }

        let mut out = Map::with_capacity(root_map.len() + 1);
        if !merged_defs.is_empty() {
            out.insert(DEFS_KEY.to_string(), Value::Object(merged_defs));
        }
        for (key, value) in root_map {
            if key != DEFS_KEY {
                out.insert(key, value);
            }
        }
        Ok(Value::Object(out))
    }

    /// Bundle `input` and write it pretty-printed to `output`, or to
    /// [`default_output_path`] when `output` is `None`. Parent directories
    /// are created. Returns the path written.
    pub fn bundle_to_file(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<PathBuf, BundleError> {
        let bundled = self.bundle(input)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));

        let write_err = |source| BundleError::Write {
            path: output.clone(),
            source,
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(&bundled).map_err(|e| BundleError::Write {
            path: output.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        std::fs::write(&output, text).map_err(write_err)?;
        tracing::info!(input = %input.display(), output = %output.display(), "bundled schema");
        Ok(output)
    }
}

/// `<input dir>/dist/<input file name>`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let name = input.file_name().map(PathBuf::from).unwrap_or_default();
    dir.join("dist").join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_from_fragment() {
        let mut ctx = BundleContext::new();
        assert_eq!(
            ctx.register_alias("a#/$defs/User".into(), "types", "/$defs/User"),
            "types_$defs_User"
        );
        assert_eq!(ctx.register_alias("b#".into(), "types", ""), "types_root");
    }

    #[test]
    fn test_alias_collisions_get_numeric_suffixes() {
        let mut ctx = BundleContext::new();
        assert_eq!(ctx.register_alias("x/one#/a".into(), "t", "/a"), "t_a");
        assert_eq!(ctx.register_alias("y/one#/a".into(), "t", "/a"), "t_a_1");
        assert_eq!(ctx.register_alias("z/one#/a".into(), "t", "/a"), "t_a_2");
    }

    #[test]
    fn test_default_output_goes_to_dist() {
        assert_eq!(
            default_output_path(Path::new("schemas/catalog.json")),
            PathBuf::from("schemas/dist/catalog.json")
        );
    }

    #[test]
    fn test_local_refs_are_untouched_without_io() {
        let mut ctx = BundleContext::new();
        let schema = serde_json::json!({ "items": { "$ref": "#/$defs/Local" } });
        let out = ctx.process(schema.clone(), Path::new("/nonexistent/root.json")).unwrap();
        assert_eq!(out, schema);
        assert_eq!(ctx.cached_files(), 0);
    }
}
