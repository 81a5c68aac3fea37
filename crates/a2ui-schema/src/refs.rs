//! # Reference Field Discovery
//!
//! Decides, once per catalog, which component properties are graph edges
//! and then extracts the referenced ids from component instances.
//!
//! ## Design
//!
//! Classification is a pure function of a property subschema returning a
//! [`RefKind`]. The per-catalog result is an immutable [`ReferenceFieldMap`]
//! that validation reads on every call without re-inspecting the schema.

use std::collections::{BTreeMap, BTreeSet};

use a2ui_core::{ProtocolVersion, CATALOG_COMPONENTS_KEY, REF_KEY};
use serde_json::{Map, Value};

const COMBINATORS: [&str; 3] = ["oneOf", "anyOf", "allOf"];
const SINGLE_REF_NAMES: [&str; 3] = ["child", "contentChild", "entryPointChild"];
const LIST_REF_NAME: &str = "children";
const MONOLITHIC_COMPONENTS_POINTER: &str =
    "/properties/surfaceUpdate/properties/components/items/properties/component/properties";

/// How a component property relates to other components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Plain data.
    NotARef,
    /// Holds exactly one child component id.
    SingleRef,
    /// Holds zero or more child ids, possibly behind a wrapper object.
    ListRef,
}

/// Reference fields declared by one component type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFields {
    pub single: BTreeSet<String>,
    pub list: BTreeSet<String>,
}

impl ReferenceFields {
    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.list.is_empty()
    }

    pub fn kind_of(&self, field: &str) -> RefKind {
        if self.single.contains(field) {
            RefKind::SingleRef
        } else if self.list.contains(field) {
            RefKind::ListRef
        } else {
            RefKind::NotARef
        }
    }
}

/// Component type name → reference fields. Types without any reference
/// field are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFieldMap {
    types: BTreeMap<String, ReferenceFields>,
}

/// One graph edge found in a component instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    /// The referenced component id.
    pub target: String,
    /// Field label, e.g. `children.explicitList` or `tabs[1].child`.
    pub field: String,
}

impl ReferenceFieldMap {
    /// Classify every component definition reachable for `version`.
    ///
    /// The monolithic generation declares components inside the message
    /// schema; that location is inspected first and the catalog's
    /// `components` section is the fallback.
    pub fn from_schemas(
        version: ProtocolVersion,
        s2c_schema: &Value,
        catalog_schema: &Value,
    ) -> Self {
        let mut definitions = None;
        if version.is_monolithic() {
            definitions = s2c_schema
                .pointer(MONOLITHIC_COMPONENTS_POINTER)
                .and_then(Value::as_object)
                .filter(|m| !m.is_empty());
        }
        let definitions = definitions.or_else(|| {
            catalog_schema
                .get(CATALOG_COMPONENTS_KEY)
                .and_then(Value::as_object)
        });

        match definitions {
            Some(defs) => Self::from_component_definitions(defs),
            None => Self::default(),
        }
    }

    /// Classify an explicit `name → definition` map.
    pub fn from_component_definitions(definitions: &Map<String, Value>) -> Self {
        let mut types = BTreeMap::new();
        for (name, definition) in definitions {
            let mut fields = ReferenceFields::default();
            collect_fields(definition, &mut fields);
            if !fields.is_empty() {
                types.insert(name.clone(), fields);
            }
        }
        Self { types }
    }

    pub fn get(&self, component_type: &str) -> Option<&ReferenceFields> {
        self.types.get(component_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All references held by one component instance.
    ///
    /// Accepts the flattened shape (`{"id", "component": "Type", ...}`) and
    /// the structured shape (`{"id", "component": {"Type": {...}}}`).
    pub fn component_references(&self, component: &Value) -> Vec<ComponentReference> {
        let mut refs = Vec::new();
        match component.get("component") {
            Some(Value::String(component_type)) => {
                if let Some(props) = component.as_object() {
                    self.collect_references(component_type, props, &mut refs);
                }
            }
            Some(Value::Object(structured)) => {
                for (component_type, props) in structured {
                    if let Value::Object(props) = props {
                        self.collect_references(component_type, props, &mut refs);
                    }
                }
            }
            _ => {}
        }
        refs
    }

    fn collect_references(
        &self,
        component_type: &str,
        props: &Map<String, Value>,
        out: &mut Vec<ComponentReference>,
    ) {
        if component_type.is_empty() {
            return;
        }
        let empty = ReferenceFields::default();
        let fields = self.types.get(component_type).unwrap_or(&empty);

        for (key, value) in props {
            match fields.kind_of(key) {
                RefKind::SingleRef => single_reference(key, value, out),
                RefKind::ListRef => list_reference(key, value, out),
                RefKind::NotARef => {}
            }

            // Arrays of `{title, child}` style items, e.g. tabs.
            if fields.kind_of(key) != RefKind::ListRef {
                if let Value::Array(items) = value {
                    for (idx, item) in items.iter().enumerate() {
                        if let Some(child) = item.get("child").and_then(Value::as_str) {
                            if !child.is_empty() {
                                push(out, child, format!("{key}[{idx}].child"));
                            }
                        }
                    }
                }
            }
        }
    }
}

fn push(out: &mut Vec<ComponentReference>, target: &str, field: String) {
    out.push(ComponentReference {
        target: target.to_string(),
        field,
    });
}

fn single_reference(key: &str, value: &Value, out: &mut Vec<ComponentReference>) {
    match value {
        Value::String(id) => push(out, id, key.to_string()),
        Value::Object(wrapper) => {
            if let Some(id) = wrapper.get("componentId").and_then(Value::as_str) {
                push(out, id, format!("{key}.componentId"));
            }
        }
        _ => {}
    }
}

fn list_reference(key: &str, value: &Value, out: &mut Vec<ComponentReference>) {
    match value {
        Value::Array(items) => {
            for id in items.iter().filter_map(Value::as_str) {
                push(out, id, key.to_string());
            }
        }
        Value::Object(wrapper) => {
            if let Some(explicit) = wrapper.get("explicitList") {
                let label = format!("{key}.explicitList");
                for id in explicit.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    push(out, id, label.clone());
                }
            } else if let Some(template) = wrapper.get("template") {
                if let Some(id) = template.get("componentId").and_then(Value::as_str) {
                    push(out, id, format!("{key}.template.componentId"));
                }
            } else if let Some(id) = wrapper.get("componentId").and_then(Value::as_str) {
                push(out, id, format!("{key}.componentId"));
            }
        }
        _ => {}
    }
}

fn collect_fields(schema: &Value, fields: &mut ReferenceFields) {
    let Some(obj) = schema.as_object() else {
        return;
    };
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop_schema) in props {
            match classify_property(name, prop_schema) {
                RefKind::SingleRef => {
                    fields.single.insert(name.clone());
                }
                RefKind::ListRef => {
                    fields.list.insert(name.clone());
                }
                RefKind::NotARef => {}
            }
        }
    }
    for key in ["allOf", "oneOf", "anyOf"] {
        for sub in obj.get(key).and_then(Value::as_array).into_iter().flatten() {
            collect_fields(sub, fields);
        }
    }
}

/// Classify one property by name and subschema shape. Single-reference
/// evidence takes precedence over list evidence.
pub fn classify_property(name: &str, schema: &Value) -> RefKind {
    if is_component_id(schema) || SINGLE_REF_NAMES.contains(&name) {
        RefKind::SingleRef
    } else if is_child_list(schema) || name == LIST_REF_NAME {
        RefKind::ListRef
    } else {
        RefKind::NotARef
    }
}

fn ref_of(schema: &Map<String, Value>) -> &str {
    schema.get(REF_KEY).and_then(Value::as_str).unwrap_or_default()
}

fn any_branch(schema: &Map<String, Value>, check: fn(&Value) -> bool) -> bool {
    COMBINATORS.iter().any(|key| {
        schema
            .get(*key)
            .and_then(Value::as_array)
            .is_some_and(|branches| branches.iter().any(check))
    })
}

fn is_component_id(schema: &Value) -> bool {
    let Some(obj) = schema.as_object() else {
        return false;
    };
    let reference = ref_of(obj);
    if reference.ends_with("ComponentId")
        || reference.ends_with("child")
        || reference.contains("/child")
    {
        return true;
    }
    if obj.get("type").and_then(Value::as_str) == Some("string")
        && obj.get("title").and_then(Value::as_str) == Some("ComponentId")
    {
        return true;
    }
    any_branch(obj, is_component_id)
}

fn is_child_list(schema: &Value) -> bool {
    let Some(obj) = schema.as_object() else {
        return false;
    };
    let reference = ref_of(obj);
    if reference.ends_with("ChildList")
        || reference.ends_with("children")
        || reference.contains("/children")
    {
        return true;
    }
    match obj.get("type").and_then(Value::as_str) {
        Some("object") => {
            if let Some(props) = obj.get("properties").and_then(Value::as_object) {
                if ["explicitList", "template", "componentId"]
                    .iter()
                    .any(|k| props.contains_key(*k))
                {
                    return true;
                }
            }
        }
        Some("array") => {
            if obj.get("items").is_some_and(is_component_id) {
                return true;
            }
        }
        _ => {}
    }
    any_branch(obj, is_child_list)
}
