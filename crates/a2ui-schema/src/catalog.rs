//! # Catalog
//!
//! A named, versioned bundle of the three schema documents that describe a
//! UI component vocabulary: the server-to-client message schema, the
//! common types and the catalog of component definitions.
//!
//! ## Design
//!
//! A [`Catalog`] is immutable. Documents sit behind [`Arc`] so catalogs can
//! be cloned cheaply and shared between concurrent validation calls;
//! pruning and resolution produce a new value instead of mutating.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use a2ui_core::{ProtocolVersion, CATALOG_ID_KEY};
use serde::Deserialize;
use serde_json::Value;

use crate::compose::{prune_catalog_schema, resolve_catalog_schema};
use crate::error::CatalogError;
use crate::fixer::PayloadFixer;
use crate::validate::ConformanceValidator;

pub const BASIC_CATALOG_NAME: &str = "basic";
pub const INLINE_CATALOG_NAME: &str = "inline";

const SCHEMA_BEGIN: &str = "---BEGIN A2UI JSON SCHEMA---";
const SCHEMA_END: &str = "---END A2UI JSON SCHEMA---";

/// Where a custom catalog lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    pub name: String,
    pub catalog_path: PathBuf,
    #[serde(default)]
    pub examples_path: Option<PathBuf>,
}

#[derive(Clone, PartialEq)]
pub struct Catalog {
    version: ProtocolVersion,
    name: String,
    s2c_schema: Arc<Value>,
    common_types_schema: Arc<Value>,
    catalog_schema: Arc<Value>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("catalog_id", &self.catalog_schema.get(CATALOG_ID_KEY))
            .finish()
    }
}

impl Catalog {
    pub fn new(
        version: ProtocolVersion,
        name: impl Into<String>,
        s2c_schema: Value,
        common_types_schema: Value,
        catalog_schema: Value,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            s2c_schema: Arc::new(s2c_schema),
            common_types_schema: Arc::new(common_types_schema),
            catalog_schema: Arc::new(catalog_schema),
        }
    }

    /// Same message and common-types documents, different catalog document.
    pub fn with_catalog_schema(&self, name: impl Into<String>, catalog_schema: Value) -> Self {
        Self {
            version: self.version,
            name: name.into(),
            s2c_schema: Arc::clone(&self.s2c_schema),
            common_types_schema: Arc::clone(&self.common_types_schema),
            catalog_schema: Arc::new(catalog_schema),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn s2c_schema(&self) -> &Value {
        &self.s2c_schema
    }

    pub fn common_types_schema(&self) -> &Value {
        &self.common_types_schema
    }

    pub fn catalog_schema(&self) -> &Value {
        &self.catalog_schema
    }

    /// The catalog's `catalogId`. Never defaulted.
    pub fn catalog_id(&self) -> Result<&str, CatalogError> {
        self.catalog_schema
            .get(CATALOG_ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::MissingCatalogId {
                name: self.name.clone(),
            })
    }

    /// Compile a validator for this catalog. Callers should keep the result
    /// for as long as the catalog is in use.
    pub fn validator(&self) -> Result<ConformanceValidator, CatalogError> {
        ConformanceValidator::new(self)
    }

    pub fn payload_fixer(&self) -> Result<PayloadFixer, CatalogError> {
        Ok(PayloadFixer::new(self.validator()?))
    }

    /// A catalog whose custom definitions are merged with `base`. See
    /// [`resolve_catalog_schema`].
    pub fn resolved_against(&self, base: &Value) -> Self {
        let resolved = resolve_catalog_schema(base, &self.catalog_schema);
        self.with_catalog_schema(self.name.clone(), resolved)
    }

    /// A catalog limited to `allowed` components. An empty list returns an
    /// identical catalog.
    pub fn with_pruned_components<S: AsRef<str>>(&self, allowed: &[S]) -> Self {
        if allowed.is_empty() {
            return self.clone();
        }
        let pruned = prune_catalog_schema(&self.catalog_schema, allowed);
        self.with_catalog_schema(self.name.clone(), pruned)
    }

    /// The three documents between literal markers, message schema first.
    pub fn render_as_llm_instructions(&self) -> String {
        let mut blocks = vec![SCHEMA_BEGIN.to_string()];

        let s2c = if is_truthy(&self.s2c_schema) {
            pretty(&self.s2c_schema)
        } else {
            "{}".to_string()
        };
        blocks.push(format!("### Server To Client Schema:\n{s2c}"));

        if is_truthy(&self.common_types_schema) {
            blocks.push(format!(
                "### Common Types Schema:\n{}",
                pretty(&self.common_types_schema)
            ));
        }

        blocks.push(format!("### Catalog Schema:\n{}", pretty(&self.catalog_schema)));
        blocks.push(SCHEMA_END.to_string());
        blocks.join("\n\n")
    }

    /// Concatenate the `*.json` examples in `path`, in file-name order.
    ///
    /// With `validate`, examples that do not parse or do not pass this
    /// catalog's validator are skipped with a warning. A missing directory
    /// yields an empty string.
    pub fn load_examples(&self, path: Option<&Path>, validate: bool) -> String {
        let Some(dir) = path else {
            return String::new();
        };
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "example path is not a directory");
            return String::new();
        }

        let mut files: Vec<_> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "failed to list examples");
                return String::new();
            }
        };
        files.sort();

        let validator = if validate {
            match self.validator() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(catalog = %self.name, error = %e, "cannot validate examples");
                    return String::new();
                }
            }
        } else {
            None
        };

        let mut merged = Vec::new();
        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "failed to load example");
                    continue;
                }
            };
            if let Some(validator) = &validator {
                if let Err(reason) = check_example(validator, &content) {
                    tracing::warn!(
                        path = %file.display(),
                        error = %reason,
                        "failed to validate example"
                    );
                    continue;
                }
            }
            merged.push(format!("---BEGIN {stem}---\n{content}\n---END {stem}---"));
        }
        merged.join("\n\n")
    }
}

fn check_example(validator: &ConformanceValidator, content: &str) -> Result<(), String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    validator.validate(&value).map_err(|e| e.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(common_types: Value) -> Catalog {
        Catalog::new(
            ProtocolVersion::V0_9,
            "basic",
            json!({ "title": "s2c" }),
            common_types,
            json!({ "catalogId": "basic-id", "components": { "Text": {}, "Card": {} } }),
        )
    }

    #[test]
    fn test_catalog_id_is_required() {
        let c = Catalog::new(ProtocolVersion::V0_9, "bad", json!({}), json!({}), json!({}));
        assert_eq!(
            c.catalog_id().unwrap_err(),
            CatalogError::MissingCatalogId { name: "bad".into() }
        );
        assert_eq!(catalog(json!({})).catalog_id().unwrap(), "basic-id");
    }

    #[test]
    fn test_render_orders_blocks_and_omits_empty_common_types() {
        let text = catalog(json!({})).render_as_llm_instructions();
        assert!(text.starts_with(
            "---BEGIN A2UI JSON SCHEMA---\n\n### Server To Client Schema:\n{\n  \"title\": \"s2c\"\n}"
        ));
        assert!(!text.contains("### Common Types Schema:"));
        assert!(text.ends_with("}\n\n---END A2UI JSON SCHEMA---"));

        let with_types = catalog(json!({ "$defs": {} })).render_as_llm_instructions();
        let s2c = with_types.find("### Server To Client Schema:").unwrap();
        let common = with_types.find("### Common Types Schema:").unwrap();
        let cat = with_types.find("### Catalog Schema:").unwrap();
        assert!(s2c < common && common < cat);
    }

    #[test]
    fn test_render_preserves_key_order() {
        let text = catalog(json!({})).render_as_llm_instructions();
        assert!(text.find("\"Text\"").unwrap() < text.find("\"Card\"").unwrap());
    }

    #[test]
    fn test_pruning_shares_untouched_documents() {
        let c = catalog(json!({}));
        let pruned = c.with_pruned_components(&["Text"]);
        assert!(Arc::ptr_eq(&c.s2c_schema, &pruned.s2c_schema));
        assert_eq!(pruned.catalog_schema()["components"], json!({ "Text": {} }));
        assert_eq!(c.catalog_schema()["components"], json!({ "Text": {}, "Card": {} }));
    }

    #[test]
    fn test_missing_examples_dir_is_empty() {
        let c = catalog(json!({}));
        assert_eq!(c.load_examples(None, false), "");
        assert_eq!(c.load_examples(Some(Path::new("/definitely/not/here")), false), "");
    }
}
