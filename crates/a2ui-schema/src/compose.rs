//! # Catalog Composer
//!
//! Merges a partial or custom catalog document against a base catalog and
//! restricts a catalog to an allowlist of component names.
//!
//! ## Design
//!
//! Resolution is best-effort: a reference that cannot be followed is
//! logged at `warn` and contributes nothing. A section `$ref` is dropped
//! either way; an unresolved collector entry stays as written. Nothing here returns an error, so a
//! bad custom catalog degrades to "partially merged" instead of blocking
//! agent startup. Both operations return new documents and never touch
//! their inputs.

use a2ui_core::{
    DocumentRegistry, CATALOG_COMPONENTS_KEY, CATALOG_FUNCTIONS_KEY, CATALOG_ID_KEY, DEFS_KEY,
    REF_KEY,
};
use serde_json::{Map, Value};

const ANY_COMPONENT: &str = "anyComponent";
const ANY_FUNCTION: &str = "anyFunction";
const ONE_OF: &str = "oneOf";

/// Resolve the `$ref`s of `custom` against `base`.
///
/// - A `components`, `functions` or `$defs` section of the form
///   `{"$ref": uri, ...}` receives every key of the referenced object that
///   it does not already define, then loses its `$ref`.
/// - Each `$ref` entry in `$defs.anyComponent.oneOf` or
///   `$defs.anyFunction.oneOf` that points at an object with its own
///   `oneOf` is replaced by that list's items, skipping duplicates. Spliced
///   refs into `#/components/*` or `#/functions/*` pull the definition from
///   `base` into the result when it is missing there.
///
/// Relative references are resolved against the custom document's `$id`
/// (or its `catalogId`).
pub fn resolve_catalog_schema(base: &Value, custom: &Value) -> Value {
    let mut result = custom.clone();
    let registry = base_registry(base);
    let base_uri = document_uri(custom);
    let lookup = |reference: &str| -> Option<Value> {
        match registry.resolve(reference, base_uri.as_deref()) {
            Ok(value) => Some(value.clone()),
            Err(e) => {
                tracing::warn!(reference, error = %e, "could not resolve catalog reference");
                None
            }
        }
    };

    let Some(sections) = result.as_object_mut() else {
        return result;
    };

    for section in [CATALOG_COMPONENTS_KEY, CATALOG_FUNCTIONS_KEY, DEFS_KEY] {
        if let Some(Value::Object(target)) = sections.get_mut(section) {
            merge_section_ref(target, &lookup);
        }
    }

    let mut pulled_components = Vec::new();
    let mut pulled_functions = Vec::new();
    if let Some(Value::Object(defs)) = sections.get_mut(DEFS_KEY) {
        for name in [ANY_COMPONENT, ANY_FUNCTION] {
            let Some(Value::Object(collector)) = defs.get_mut(name) else {
                continue;
            };
            let items = match collector.get(ONE_OF) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            let mut spliced: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let reference = item.get(REF_KEY).and_then(Value::as_str);
                let sub_items = match reference {
                    Some(r) if !r.starts_with('#') => lookup(r).and_then(|resolved| {
                        resolved.get(ONE_OF).and_then(Value::as_array).cloned()
                    }),
                    _ => None,
                };
                let Some(sub_items) = sub_items else {
                    spliced.push(item);
                    continue;
                };
                for sub in sub_items {
                    if spliced.contains(&sub) {
                        continue;
                    }
                    if let Some(sub_ref) = sub.get(REF_KEY).and_then(Value::as_str) {
                        if let Some(comp) = sub_ref.strip_prefix("#/components/") {
                            pulled_components.push(last_segment(comp).to_string());
                        } else if let Some(func) = sub_ref.strip_prefix("#/functions/") {
                            pulled_functions.push(last_segment(func).to_string());
                        }
                    }
                    spliced.push(sub);
                }
            }
            collector.insert(ONE_OF.to_string(), Value::Array(spliced));
        }
    }

    copy_missing_definitions(sections, base, CATALOG_COMPONENTS_KEY, &pulled_components);
    copy_missing_definitions(sections, base, CATALOG_FUNCTIONS_KEY, &pulled_functions);
    result
}

/// Restrict `catalog_schema` to the named components.
///
/// An empty allowlist means "no restriction" and returns the document
/// unchanged. Otherwise `components` keeps only allowed names and
/// `$defs.anyComponent.oneOf` keeps only `#/components/<allowed>` refs;
/// any other entry shape is dropped with a warning.
pub fn prune_catalog_schema<S: AsRef<str>>(catalog_schema: &Value, allowed: &[S]) -> Value {
    let mut pruned = catalog_schema.clone();
    if allowed.is_empty() {
        return pruned;
    }
    let is_allowed = |name: &str| allowed.iter().any(|a| a.as_ref() == name);

    if let Some(Value::Object(components)) = pruned.get_mut(CATALOG_COMPONENTS_KEY) {
        components.retain(|name, _| is_allowed(name));
    }

    if let Some(Value::Array(one_of)) = pruned
        .get_mut(DEFS_KEY)
        .and_then(|defs| defs.get_mut(ANY_COMPONENT))
        .and_then(|any| any.get_mut(ONE_OF))
    {
        let prefix = format!("#/{CATALOG_COMPONENTS_KEY}/");
        one_of.retain(|item| match item.get(REF_KEY) {
            Some(Value::String(reference)) if reference.starts_with(&prefix) => {
                is_allowed(last_segment(reference))
            }
            Some(reference) => {
                tracing::warn!(
                    reference = %reference,
                    "skipping unknown ref format in anyComponent"
                );
                false
            }
            None => {
                tracing::warn!(item = %item, "skipping non-ref item in anyComponent");
                false
            }
        });
    }
    pruned
}

fn base_registry(base: &Value) -> DocumentRegistry {
    let mut registry = DocumentRegistry::new();
    let catalog_id = base.get(CATALOG_ID_KEY).and_then(Value::as_str);
    if let Some(id) = catalog_id {
        registry.insert(id, base.clone());
    }
    if let Some(id) = base.get("$id").and_then(Value::as_str) {
        if Some(id) != catalog_id {
            registry.insert(id, base.clone());
        }
    }
    registry
}

fn document_uri(document: &Value) -> Option<String> {
    document
        .get("$id")
        .or_else(|| document.get(CATALOG_ID_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn merge_section_ref(target: &mut Map<String, Value>, lookup: &impl Fn(&str) -> Option<Value>) {
    let Some(reference) = target.get(REF_KEY).cloned() else {
        return;
    };
    if let Some(Value::Object(resolved)) = reference.as_str().and_then(lookup) {
        for (key, value) in resolved {
            target.entry(key).or_insert(value);
        }
    }
    target.remove(REF_KEY);
}

fn copy_missing_definitions(
    sections: &mut Map<String, Value>,
    base: &Value,
    section: &str,
    names: &[String],
) {
    let Some(base_section) = base.get(section).and_then(Value::as_object) else {
        return;
    };
    for name in names {
        let Some(definition) = base_section.get(name) else {
            continue;
        };
        let target = sections
            .entry(section)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(target) = target {
            target
                .entry(name.clone())
                .or_insert_with(|| definition.clone());
        }
    }
}

fn last_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}
