//! # Conformance Validator
//!
//! Validates generated payloads against a catalog: JSON Schema structure
//! first, then the graph invariants JSON Schema cannot express.
//!
//! ## Composition
//!
//! The compiled schema is always "array of message". How the message schema
//! is combined with the catalog depends on the protocol generation:
//!
//! - **Monolithic** (`0.8`): open `component`/`styles` slots in the message
//!   schema (`additionalProperties: true`) are closed and receive the
//!   catalog's `components`/`styles` as declared properties. Only the
//!   common-types document is served by reference.
//! - **Registry** (`0.9`): the message schema keeps its relative refs
//!   (`catalog.json#/$defs/anyComponent`) and the catalog and common-types
//!   documents are served under sibling URIs of the message schema's `$id`,
//!   under their bare file names, and under the catalog id.
//!
//! Every document with an absolute URI is registered with the compiler up
//! front; [`LocalSchemaRetriever`] answers anything else from memory.
//! Nothing is fetched over the network.
//!
//! ## Check Order
//!
//! 1. Schema. The first structural error ends validation.
//! 2. Per message: integrity, then topology, then recursion and paths.

use std::collections::HashMap;
use std::fmt;

use a2ui_core::{
    sibling_uri, ProtocolVersion, BASE_SCHEMA_URL, CATALOG_COMPONENTS_KEY, CATALOG_STYLES_KEY,
    DRAFT_2020_12,
};
use serde_json::{json, Map, Value};

use crate::catalog::Catalog;
use crate::error::{CatalogError, SchemaViolation, ValidationError};
use crate::graph::{check_integrity, check_topology};
use crate::limits::check_recursion_and_paths;
use crate::refs::ReferenceFieldMap;

const DEFAULT_ROOT_ID: &str = "root";
const CATALOG_FILE: &str = "catalog.json";
const COMMON_TYPES_FILE: &str = "common_types.json";
const SERVER_TO_CLIENT_FILE: &str = "server_to_client.json";

/// Serves registered schema documents to the `jsonschema` crate.
///
/// Lookup is by exact URI, then by the last path segment. Unknown URIs are
/// an error so that a broken reference fails validator construction
/// instead of silently accepting anything.
struct LocalSchemaRetriever {
    schemas: HashMap<String, Value>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.schemas.get(uri_str) {
            return Ok(value.clone());
        }
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.schemas
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

/// A compiled, reusable validator for one catalog.
///
/// `Send + Sync`; [`validate`](Self::validate) takes `&self` and keeps no
/// state between calls.
pub struct ConformanceValidator {
    version: ProtocolVersion,
    catalog_name: String,
    schema: jsonschema::Validator,
    ref_fields: ReferenceFieldMap,
}

impl fmt::Debug for ConformanceValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConformanceValidator")
            .field("version", &self.version)
            .field("catalog", &self.catalog_name)
            .field("component_types_with_refs", &self.ref_fields.len())
            .finish()
    }
}

impl ConformanceValidator {
    /// Compose and compile the schema for `catalog` and classify its
    /// reference fields.
    ///
    /// # Errors
    ///
    /// [`CatalogError::MissingCatalogId`] when the registry strategy needs a
    /// catalog id and there is none; [`CatalogError::ValidatorBuild`] when
    /// the composed schema does not compile or references an unknown
    /// document.
    pub fn new(catalog: &Catalog) -> Result<Self, CatalogError> {
        let version = catalog.version();
        let (s2c_uri, s2c_document, resources) = if version.is_monolithic() {
            tracing::debug!(
                catalog = %catalog.name(),
                %version,
                strategy = "monolithic",
                "building conformance validator"
            );
            monolithic_resources(catalog)
        } else {
            tracing::debug!(
                catalog = %catalog.name(),
                %version,
                strategy = "registry",
                "building conformance validator"
            );
            registry_resources(catalog)?
        };

        let items = if is_truthy(&s2c_document) {
            json!({ "$ref": s2c_uri })
        } else {
            json!({})
        };
        let wrapper = json!({
            "$schema": DRAFT_2020_12,
            "type": "array",
            "items": items,
        });

        let mut schemas = resources;
        schemas.insert(s2c_uri, s2c_document);
        let schema =
            compile(&wrapper, schemas).map_err(|reason| CatalogError::ValidatorBuild {
                catalog: catalog.name().to_string(),
                reason,
            })?;

        let ref_fields = ReferenceFieldMap::from_schemas(
            version,
            catalog.s2c_schema(),
            catalog.catalog_schema(),
        );

        Ok(Self {
            version,
            catalog_name: catalog.name().to_string(),
            schema,
            ref_fields,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn ref_fields(&self) -> &ReferenceFieldMap {
        &self.ref_fields
    }

    /// Validate one message or an array of messages.
    pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
        let wrapped;
        let messages = match payload {
            Value::Array(_) => payload,
            single => {
                wrapped = Value::Array(vec![single.clone()]);
                &wrapped
            }
        };

        if let Some(violation) = self.first_schema_violation(messages) {
            return Err(ValidationError::Schema(violation));
        }

        let messages = messages.as_array().map(Vec::as_slice).unwrap_or_default();
        let root_id = self.root_id(messages);

        for message in messages.iter().filter(|m| m.is_object()) {
            if let Some(components) = components_of(message).filter(|c| !c.is_empty()) {
                check_integrity(root_id, components, &self.ref_fields)?;
                check_topology(root_id, components, &self.ref_fields)?;
            }
            check_recursion_and_paths(message)?;
        }
        Ok(())
    }

    fn first_schema_violation(&self, instance: &Value) -> Option<SchemaViolation> {
        let (instance_path, schema_path, message) = {
            let error = self.schema.iter_errors(instance).next()?;
            (
                error.instance_path.to_string(),
                error.schema_path.to_string(),
                error.to_string(),
            )
        };
        let context = if schema_path.ends_with("/oneOf") || schema_path.ends_with("/anyOf") {
            self.branch_failures(instance, &schema_path)
        } else {
            Vec::new()
        };
        Some(SchemaViolation {
            instance_path,
            schema_path,
            message,
            context,
        })
    }

    /// Leaf errors below the failing combinator, read from the validator's
    /// basic output.
    fn branch_failures(&self, instance: &Value, combinator_path: &str) -> Vec<SchemaViolation> {
        let output = self.schema.apply(instance).basic();
        let Ok(output) = serde_json::to_value(&output) else {
            return Vec::new();
        };
        let prefix = format!("{combinator_path}/");
        output
            .get("errors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|unit| {
                let keyword = unit.get("keywordLocation")?.as_str()?;
                if !keyword.starts_with(&prefix) {
                    return None;
                }
                let message = match unit.get("error") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Some(SchemaViolation {
                    instance_path: unit
                        .get("instanceLocation")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    schema_path: keyword.to_string(),
                    message,
                    context: Vec::new(),
                })
            })
            .collect()
    }

    /// `beginRendering.root` of the first message that has one for the
    /// monolithic generation; always `root` otherwise.
    fn root_id<'a>(&self, messages: &'a [Value]) -> &'a str {
        if !self.version.is_monolithic() {
            return DEFAULT_ROOT_ID;
        }
        messages
            .iter()
            .find_map(|m| m.get("beginRendering"))
            .and_then(|begin| begin.get("root"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ROOT_ID)
    }
}

/// Compile `wrapper` with every absolute-URI document registered up front.
///
/// Refs nested under non-keyword containers (`components/*`) are not found
/// by the registry crawl, so those documents must already be present. The
/// retriever answers the remaining bare-name lookups.
fn compile(
    wrapper: &Value,
    schemas: HashMap<String, Value>,
) -> Result<jsonschema::Validator, String> {
    let mut options = jsonschema::options();
    options.with_draft(jsonschema::Draft::Draft202012);

    let mut uris: Vec<&String> = schemas.keys().filter(|uri| uri.contains("://")).collect();
    uris.sort();
    for uri in uris {
        let resource = jsonschema::Resource::from_contents(schemas[uri].clone())
            .map_err(|e| format!("invalid schema document '{uri}': {e}"))?;
        options.with_resource(uri.as_str(), resource);
    }

    options.with_retriever(LocalSchemaRetriever { schemas });
    options.build(wrapper).map_err(|e| e.to_string())
}

fn components_of(message: &Value) -> Option<&[Value]> {
    let container = match message.get("surfaceUpdate") {
        Some(update) => update,
        None => message.get("updateComponents").filter(|u| u.is_object())?,
    };
    container
        .get("components")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn s2c_uri(s2c_schema: &Value) -> String {
    s2c_schema
        .get("$id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{BASE_SCHEMA_URL}{SERVER_TO_CLIENT_FILE}"))
}

fn register_common_types(
    resources: &mut HashMap<String, Value>,
    s2c_uri: &str,
    common_types: &Value,
) {
    if common_types.is_null() {
        return;
    }
    resources.insert(sibling_uri(s2c_uri, COMMON_TYPES_FILE), common_types.clone());
    resources.insert(COMMON_TYPES_FILE.to_string(), common_types.clone());
    register_own_id(resources, common_types);
}

/// Also serve `document` under its own `$id`, if it declares one.
fn register_own_id(resources: &mut HashMap<String, Value>, document: &Value) {
    if let Some(id) = document.get("$id").and_then(Value::as_str) {
        resources
            .entry(id.to_string())
            .or_insert_with(|| document.clone());
    }
}

type ComposedResources = (String, Value, HashMap<String, Value>);

fn monolithic_resources(catalog: &Catalog) -> ComposedResources {
    let s2c = catalog.s2c_schema();
    let uri = s2c_uri(s2c);

    let mut sources = Map::new();
    if let Some(components) = catalog.catalog_schema().get(CATALOG_COMPONENTS_KEY) {
        sources.insert("component".to_string(), components.clone());
    }
    if let Some(styles) = catalog.catalog_schema().get(CATALOG_STYLES_KEY) {
        sources.insert(CATALOG_STYLES_KEY.to_string(), styles.clone());
    }
    let patched = if is_truthy(s2c) {
        inject_catalog_definitions(s2c, &sources)
    } else {
        Value::Object(Map::new())
    };

    let mut resources = HashMap::new();
    register_common_types(&mut resources, &uri, catalog.common_types_schema());
    (uri, patched, resources)
}

fn registry_resources(catalog: &Catalog) -> Result<ComposedResources, CatalogError> {
    let catalog_id = catalog.catalog_id()?;
    let s2c = catalog.s2c_schema();
    let uri = s2c_uri(s2c);
    let catalog_uri = sibling_uri(&uri, CATALOG_FILE);

    let mut resources = HashMap::new();
    register_common_types(&mut resources, &uri, catalog.common_types_schema());
    resources.insert(catalog_uri.clone(), catalog.catalog_schema().clone());
    resources.insert(CATALOG_FILE.to_string(), catalog.catalog_schema().clone());
    if catalog_id != catalog_uri {
        resources.insert(catalog_id.to_string(), catalog.catalog_schema().clone());
    }
    register_own_id(&mut resources, catalog.catalog_schema());
    Ok((uri, s2c.clone(), resources))
}

/// Close every open node whose key names a catalog section, declaring the
/// section's definitions as its properties. Injected nodes are not
/// descended into.
pub fn inject_catalog_definitions(schema: &Value, sources: &Map<String, Value>) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let is_open = value.get("additionalProperties") == Some(&Value::Bool(true));
                let node = match (is_open, sources.get(key), value) {
                    (true, Some(Value::Object(definitions)), Value::Object(node)) => {
                        close_node(node, definitions)
                    }
                    _ => inject_catalog_definitions(value, sources),
                };
                out.insert(key.clone(), node);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| inject_catalog_definitions(item, sources))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn close_node(node: &Map<String, Value>, definitions: &Map<String, Value>) -> Value {
    let mut closed = node.clone();
    closed.insert("additionalProperties".to_string(), Value::Bool(false));
    let mut properties = match closed.remove("properties") {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };
    for (name, definition) in definitions {
        properties.insert(name.clone(), definition.clone());
    }
    closed.insert("properties".to_string(), Value::Object(properties));
    Value::Object(closed)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
