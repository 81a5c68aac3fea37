//! Shared fixtures: a miniature specification tree under `tests/fixtures`.

#![allow(dead_code)]

use std::path::PathBuf;

use a2ui_core::ProtocolVersion;
use a2ui_schema::{Catalog, SpecDocuments};
use serde_json::{json, Value};

/// Root containing `specification/v0_8` and `specification/v0_9`.
pub fn spec_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn documents(version: ProtocolVersion) -> SpecDocuments {
    SpecDocuments::load(version, &spec_root()).expect("fixture documents load")
}

pub fn catalog(version: ProtocolVersion) -> Catalog {
    let docs = documents(version);
    Catalog::new(
        version,
        "standard",
        docs.server_to_client,
        docs.common_types,
        docs.basic_catalog,
    )
}

pub fn catalog_0_8() -> Catalog {
    catalog(ProtocolVersion::V0_8)
}

pub fn catalog_0_9() -> Catalog {
    catalog(ProtocolVersion::V0_9)
}

/// Wrap flattened components (`{"id", "component": "Type", ...props}`)
/// into an update message of the catalog's generation. Returns the
/// message list.
pub fn components_payload(catalog: &Catalog, components: Vec<Value>) -> Value {
    if catalog.version().is_monolithic() {
        let structured: Vec<Value> = components.into_iter().map(to_structured).collect();
        json!([{ "surfaceUpdate": { "surfaceId": "test-surface", "components": structured } }])
    } else {
        json!([{
            "version": "v0.9",
            "updateComponents": { "surfaceId": "test-surface", "components": components }
        }])
    }
}

pub fn data_model_payload(catalog: &Catalog, value: Value) -> Value {
    if catalog.version().is_monolithic() {
        json!([{ "dataModelUpdate": { "surfaceId": "test-surface", "contents": value } }])
    } else {
        json!([{
            "version": "v0.9",
            "updateDataModel": { "surfaceId": "test-surface", "value": value }
        }])
    }
}

/// `{"id", "component": "T", ...}` → `{"id", "component": {"T": {...}}}`.
fn to_structured(component: Value) -> Value {
    let Value::Object(mut map) = component else {
        return component;
    };
    let id = map.remove("id").unwrap_or(Value::Null);
    match map.remove("component") {
        Some(Value::String(kind)) => json!({ "id": id, "component": { kind: Value::Object(map) } }),
        Some(other) => json!({ "id": id, "component": other }),
        None => json!({ "id": id }),
    }
}

/// Both generations, for checks that hold regardless of composition
/// strategy.
pub fn both_catalogs() -> [Catalog; 2] {
    [catalog_0_8(), catalog_0_9()]
}
