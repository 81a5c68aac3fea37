//! # JSON Pointer Grammar and Navigation
//!
//! RFC 6901 pointers appear in two places: as the fragment of a `$ref`
//! (`file.json#/$defs/Name`) and as data-binding `path` values inside
//! generated payloads. This module checks the grammar of the latter and
//! follows the former.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::PointerError;

/// `(/(unescaped | ~0 | ~1)*)*` — empty segments are legal.
static JSON_POINTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:/(?:[^~/]|~[01])*)*$").expect("JSON Pointer pattern compiles"));

/// Returns `true` if `path` is a syntactically valid JSON Pointer.
///
/// The empty string is the whole-document pointer and is valid.
pub fn is_valid_json_pointer(path: &str) -> bool {
    JSON_POINTER_PATTERN.is_match(path)
}

/// Split a `$ref` into its document part and its fragment (without `#`).
///
/// `"common_types.json#/$defs/ComponentId"` → `("common_types.json", "/$defs/ComponentId")`.
/// A reference with no `#` has an empty fragment.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((document, fragment)) => (document, fragment),
        None => (reference, ""),
    }
}

/// Follow a JSON Pointer fragment inside `document`.
///
/// Accepts the fragment with or without a leading `#`. `""` and `"#"`
/// address the whole document. Segments are unescaped (`~1` → `/`, then
/// `~0` → `~`) and numeric segments index arrays.
pub fn resolve_pointer<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value, PointerError> {
    let pointer = fragment.trim_start_matches('#');
    if pointer.is_empty() {
        return Ok(document);
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);

    let mut current = document;
    for raw in body.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment).ok_or_else(|| PointerError::MissingKey {
                pointer: fragment.to_string(),
                segment: segment.clone(),
            })?,
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| PointerError::BadIndex {
                    pointer: fragment.to_string(),
                    segment: segment.clone(),
                })?,
            _ => {
                return Err(PointerError::NotAContainer {
                    pointer: fragment.to_string(),
                    segment,
                })
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_grammar_accepts_well_formed_paths() {
        assert!(is_valid_json_pointer(""));
        assert!(is_valid_json_pointer("/"));
        assert!(is_valid_json_pointer("/a/b"));
        assert!(is_valid_json_pointer("/a//b"));
        assert!(is_valid_json_pointer("/items/0/name"));
        assert!(is_valid_json_pointer("/a~0b/c~1d"));
    }

    #[test]
    fn test_pointer_grammar_rejects_malformed_paths() {
        assert!(!is_valid_json_pointer("not-a-pointer"));
        assert!(!is_valid_json_pointer("invalid//path"));
        assert!(!is_valid_json_pointer("/invalid/escape/~2"));
        assert!(!is_valid_json_pointer("/trailing~"));
        assert!(!is_valid_json_pointer("invalid path with spaces"));
    }

    #[test]
    fn test_split_reference_separates_fragment() {
        assert_eq!(
            split_reference("common_types.json#/$defs/ComponentId"),
            ("common_types.json", "/$defs/ComponentId")
        );
        assert_eq!(split_reference("ext.json"), ("ext.json", ""));
        assert_eq!(split_reference("#/components/Text"), ("", "/components/Text"));
    }

    #[test]
    fn test_resolve_pointer_navigates_objects_and_arrays() {
        let doc = json!({
            "definitions": { "User": { "type": "object" } },
            "list": ["a", "b"]
        });
        assert_eq!(
            resolve_pointer(&doc, "/definitions/User").unwrap(),
            &json!({ "type": "object" })
        );
        assert_eq!(resolve_pointer(&doc, "#/list/1").unwrap(), &json!("b"));
        assert_eq!(resolve_pointer(&doc, "").unwrap(), &doc);
        assert_eq!(resolve_pointer(&doc, "#").unwrap(), &doc);
    }

    #[test]
    fn test_resolve_pointer_unescapes_segments() {
        let doc = json!({
            "path/to/thing": "escaped slash",
            "path~to~thing": "escaped tilde"
        });
        assert_eq!(resolve_pointer(&doc, "/path~1to~1thing").unwrap(), "escaped slash");
        assert_eq!(resolve_pointer(&doc, "/path~0to~0thing").unwrap(), "escaped tilde");
    }

    #[test]
    fn test_resolve_pointer_reports_failures() {
        let doc = json!({ "a": { "b": 1 }, "list": [] });
        assert!(matches!(
            resolve_pointer(&doc, "/a/c"),
            Err(PointerError::MissingKey { .. })
        ));
        assert!(matches!(
            resolve_pointer(&doc, "/list/0"),
            Err(PointerError::BadIndex { .. })
        ));
        assert!(matches!(
            resolve_pointer(&doc, "/a/b/c"),
            Err(PointerError::NotAContainer { .. })
        ));
    }
}
