//! # Schema Manager
//!
//! Loads the fixture specification tree, registers custom catalogs from a
//! YAML configuration and selects catalogs from client capabilities.

mod common;

use std::path::Path;

use a2ui_core::ProtocolVersion;
use a2ui_schema::{ManagerError, SchemaManager, SchemaManagerConfig, SchemaModifiers};
use common::spec_root;
use serde_json::{json, Value};
use tempfile::TempDir;

const BASIC_0_9: &str = "https://a2ui.dev/specification/v0_9/basic_catalog.json";
const CHARTS: &str = "https://example.com/catalogs/charts.json";

fn config(version: ProtocolVersion) -> SchemaManagerConfig {
    let mut config = SchemaManagerConfig::new(version);
    config.spec_root = Some(spec_root());
    config
}

/// A custom catalog plus two examples, one of them invalid.
fn write_custom_catalog(dir: &Path) {
    let catalog = json!({
        "$id": CHARTS,
        "catalogId": CHARTS,
        "components": { "$ref": format!("{BASIC_0_9}#/components") },
        "$defs": {
            "$ref": format!("{BASIC_0_9}#/$defs"),
            "anyComponent": { "oneOf": [{ "$ref": format!("{BASIC_0_9}#/$defs/anyComponent") }] }
        }
    });
    std::fs::write(dir.join("charts.json"), catalog.to_string()).unwrap();

    let examples = dir.join("examples");
    std::fs::create_dir_all(&examples).unwrap();
    std::fs::write(
        examples.join("b_greeting.json"),
        json!([{
            "version": "v0.9",
            "updateComponents": {
                "surfaceId": "s",
                "components": [{ "id": "root", "component": "Text", "text": "hi" }]
            }
        }])
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        examples.join("a_broken.json"),
        json!([{ "version": "v0.9", "updateComponents": { "surfaceId": "s", "components": [
            { "id": "root", "component": "Card", "child": "ghost" }
        ] } }])
        .to_string(),
    )
    .unwrap();
    std::fs::write(examples.join("notes.txt"), "ignored").unwrap();
}

#[test]
fn test_loads_basic_catalog_from_spec_root() {
    for version in [ProtocolVersion::V0_8, ProtocolVersion::V0_9] {
        let manager = SchemaManager::load(&config(version)).unwrap();
        assert_eq!(manager.version(), version);
        assert_eq!(manager.supported_catalog_ids().len(), 1);
        let basic = manager.basic_catalog();
        assert_eq!(basic.name(), "basic");
        basic.validator().unwrap();
    }
}

#[test]
fn test_missing_spec_documents_fail_to_load() {
    let dir = TempDir::new().unwrap();
    let mut config = SchemaManagerConfig::new(ProtocolVersion::V0_9);
    config.spec_root = Some(dir.path().to_path_buf());
    let err = SchemaManager::load(&config).unwrap_err();
    assert!(matches!(err, ManagerError::Load { .. }), "{err:?}");
}

#[test]
fn test_yaml_config_registers_custom_catalogs() {
    let dir = TempDir::new().unwrap();
    write_custom_catalog(dir.path());
    let yaml = format!(
        "version: \"0.9\"\nspec_root: {root}\ncustom_catalogs:\n  - name: charts\n    catalog_path: charts.json\n    examples_path: examples\n",
        root = spec_root().display()
    );
    let config_path = dir.path().join("a2ui.yaml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = SchemaManagerConfig::from_yaml_file(&config_path).unwrap();
    assert_eq!(config.custom_catalogs[0].catalog_path, dir.path().join("charts.json"));

    let manager = SchemaManager::load(&config).unwrap();
    assert_eq!(manager.supported_catalog_ids(), [BASIC_0_9, CHARTS]);

    let charts = manager.catalog(CHARTS).unwrap();
    assert_eq!(charts.name(), "charts");
    assert!(charts.catalog_schema()["components"].get("Text").is_some());

    let examples = manager.load_examples(charts, true);
    assert!(examples.starts_with("---BEGIN b_greeting---\n"), "{examples}");
    assert!(examples.ends_with("---END b_greeting---"));
    assert!(!examples.contains("a_broken"));

    let unvalidated = manager.load_examples(charts, false);
    assert!(unvalidated.starts_with("---BEGIN a_broken---"));
    assert!(unvalidated.contains("\n\n---BEGIN b_greeting---"));
}

/// Counts how often a document went through the modifier chain.
fn count_pass(mut schema: Value) -> Value {
    if let Some(map) = schema.as_object_mut() {
        let passes = map.get("x-passes").and_then(Value::as_u64).unwrap_or(0);
        map.insert("x-passes".into(), json!(passes + 1));
    }
    schema
}

#[test]
fn test_schema_modifiers_run_over_every_loaded_document() {
    let dir = TempDir::new().unwrap();
    write_custom_catalog(dir.path());
    let mut config = config(ProtocolVersion::V0_9);
    config.custom_catalogs = vec![a2ui_schema::CatalogConfig {
        name: "charts".into(),
        catalog_path: dir.path().join("charts.json"),
        examples_path: None,
    }];
    let modifiers = SchemaModifiers::new().with_schema_modifier(count_pass);
    let manager = SchemaManager::load_with_modifiers(&config, &modifiers).unwrap();

    let basic = manager.basic_catalog();
    assert_eq!(basic.s2c_schema()["x-passes"], 1);
    assert_eq!(basic.common_types_schema()["x-passes"], 1);
    assert_eq!(basic.catalog_schema()["x-passes"], 1);

    // Once as read from disk, once after resolution.
    let charts = manager.catalog(CHARTS).unwrap();
    assert_eq!(charts.catalog_schema()["x-passes"], 2);
    charts.validator().unwrap();
}

#[test]
fn test_schema_modifiers_apply_in_order() {
    let modifiers = SchemaModifiers::new()
        .with_schema_modifier(|mut schema: Value| {
            schema["additionalProperties"] = json!(false);
            schema
        })
        .with_schema_modifier(|mut schema: Value| {
            if let Some(map) = schema.as_object_mut() {
                map.remove("additionalProperties");
            }
            schema
        });
    let manager =
        SchemaManager::load_with_modifiers(&config(ProtocolVersion::V0_8), &modifiers).unwrap();
    assert!(manager.basic_catalog().s2c_schema().get("additionalProperties").is_none());
    assert!(manager.basic_catalog().common_types_schema().is_null());
    assert!(SchemaModifiers::default().is_empty());
}

#[test]
fn test_selects_catalog_from_capabilities() {
    let dir = TempDir::new().unwrap();
    write_custom_catalog(dir.path());
    let mut config = config(ProtocolVersion::V0_9);
    config.custom_catalogs = vec![a2ui_schema::CatalogConfig {
        name: "charts".into(),
        catalog_path: dir.path().join("charts.json"),
        examples_path: None,
    }];
    let manager = SchemaManager::load(&config).unwrap();

    let selected = manager
        .select_catalog(Some(&json!({ "supportedCatalogIds": ["https://unknown", CHARTS] })))
        .unwrap();
    assert_eq!(selected.name(), "charts");

    let err = manager
        .select_catalog(Some(&json!({ "supportedCatalogIds": ["https://unknown"] })))
        .unwrap_err();
    assert!(matches!(err, ManagerError::NoSupportedCatalog { .. }));
    assert!(err.to_string().contains(CHARTS));

    let err = manager
        .select_catalog(Some(&json!({ "inlineCatalogs": [{ "catalogId": "x" }] })))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InlineCatalogsNotAccepted));

    let pruned = manager
        .selected_catalog(Some(&json!({ "supportedCatalogIds": [CHARTS] })), &["Text"])
        .unwrap();
    let names: Vec<&String> =
        pruned.catalog_schema()["components"].as_object().unwrap().keys().collect();
    assert_eq!(names, ["Text"]);
}

#[test]
fn test_inline_catalog_is_resolved_against_basic() {
    let mut config = config(ProtocolVersion::V0_9);
    config.accepts_inline_catalogs = true;
    let manager = SchemaManager::load(&config).unwrap();

    let inline = json!({
        "catalogId": "https://client.example/inline.json",
        "components": { "$ref": format!("{BASIC_0_9}#/components") }
    });
    let selected = manager
        .select_catalog(Some(&json!({ "inlineCatalogs": [inline] })))
        .unwrap();
    assert_eq!(selected.name(), "inline");
    assert!(selected.catalog_schema()["components"].get("Card").is_some());

    let err = manager
        .select_catalog(Some(&json!({
            "inlineCatalogs": [{ "catalogId": "x" }],
            "supportedCatalogIds": [BASIC_0_9]
        })))
        .unwrap_err();
    assert!(matches!(err, ManagerError::ConflictingCapabilities));
}

#[test]
fn test_render_instructions_from_loaded_catalog() {
    let manager = SchemaManager::load(&config(ProtocolVersion::V0_8)).unwrap();
    let rendered = manager.basic_catalog().render_as_llm_instructions();
    assert!(rendered.contains("### Server To Client Schema:"));
    assert!(!rendered.contains("### Common Types Schema:"));
    assert!(rendered.contains("\"surfaceUpdate\""));
}
