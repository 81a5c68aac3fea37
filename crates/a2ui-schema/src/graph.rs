//! # Component Graph Checks
//!
//! Integrity and topology of the components carried by one message. The
//! graph is rebuilt from the instances on every call and never persisted.
//!
//! Order of checks matters for the reported error: integrity (duplicate
//! ids, root, dangling references) runs to completion before topology
//! (self-reference, cycle, depth, orphans).

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use crate::error::{IntegrityError, RecursionLimitError, TopologyError, ValidationError};
use crate::refs::{ComponentReference, ReferenceFieldMap};

/// Maximum depth of the component tree walked from the root.
pub const MAX_COMPONENT_DEPTH: usize = 50;

fn component_id(component: &Value) -> Option<&str> {
    component.get("id").and_then(Value::as_str)
}

/// Unique ids, root present, no dangling reference.
///
/// Instances without a string `id` are ignored.
pub fn check_integrity(
    root_id: &str,
    components: &[Value],
    ref_map: &ReferenceFieldMap,
) -> Result<(), IntegrityError> {
    let mut ids = HashSet::new();
    for id in components.iter().filter_map(component_id) {
        if !ids.insert(id) {
            return Err(IntegrityError::DuplicateId { id: id.to_string() });
        }
    }

    if !ids.contains(root_id) {
        return Err(IntegrityError::MissingRoot {
            root: root_id.to_string(),
        });
    }

    for component in components {
        for ComponentReference { target, field } in ref_map.component_references(component) {
            if !ids.contains(target.as_str()) {
                return Err(IntegrityError::DanglingReference {
                    component: component_id(component).unwrap_or("None").to_string(),
                    target,
                    field,
                });
            }
        }
    }
    Ok(())
}

/// No self-reference, no cycle reachable from the root, bounded depth and
/// every id reachable from the root.
pub fn check_topology(
    root_id: &str,
    components: &[Value],
    ref_map: &ReferenceFieldMap,
) -> Result<(), ValidationError> {
    let mut adjacency: HashMap<&str, Vec<String>> = HashMap::new();
    let mut all_ids: BTreeSet<&str> = BTreeSet::new();

    for component in components {
        let Some(id) = component_id(component) else {
            continue;
        };
        all_ids.insert(id);
        let edges = adjacency.entry(id).or_default();
        for reference in ref_map.component_references(component) {
            if reference.target == id {
                return Err(TopologyError::SelfReference {
                    component: id.to_string(),
                    field: reference.field,
                }
                .into());
            }
            edges.push(reference.target);
        }
    }

    let mut walk = Walk {
        adjacency: &adjacency,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
    };
    if all_ids.contains(root_id) {
        walk.visit(root_id, 0)?;
    }

    if let Some(orphan) = all_ids.iter().find(|id| !walk.visited.contains(**id)) {
        return Err(TopologyError::Orphan {
            component: orphan.to_string(),
            root: root_id.to_string(),
        }
        .into());
    }
    Ok(())
}

struct Walk<'g> {
    adjacency: &'g HashMap<&'g str, Vec<String>>,
    visited: HashSet<String>,
    on_stack: HashSet<String>,
}

impl Walk<'_> {
    fn visit(&mut self, node: &str, depth: usize) -> Result<(), ValidationError> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(RecursionLimitError::ComponentDepth {
                limit: MAX_COMPONENT_DEPTH,
            }
            .into());
        }
        self.visited.insert(node.to_string());
        self.on_stack.insert(node.to_string());

        let adjacency = self.adjacency;
        for neighbor in adjacency.get(node).into_iter().flatten() {
            if !self.visited.contains(neighbor) {
                self.visit(neighbor, depth + 1)?;
            } else if self.on_stack.contains(neighbor) {
                return Err(TopologyError::Cycle {
                    component: neighbor.clone(),
                }
                .into());
            }
        }

        self.on_stack.remove(node);
        Ok(())
    }
}
