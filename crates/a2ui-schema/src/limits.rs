//! Nesting limits and data-binding path syntax, checked over a whole
//! message rather than only its component array.

use a2ui_core::is_valid_json_pointer;
use serde_json::Value;

use crate::error::{RecursionLimitError, ValidationError};

/// Maximum container nesting anywhere in a message.
pub const MAX_STRUCTURAL_DEPTH: usize = 50;

/// Maximum function calls nested through `args`.
pub const MAX_FUNCTION_CALL_DEPTH: usize = 5;

const PATH_KEY: &str = "path";
const CALL_KEY: &str = "call";
const ARGS_KEY: &str = "args";

/// Walk `message` enforcing both depth ceilings and the pointer grammar of
/// every string stored under a `path` key.
pub fn check_recursion_and_paths(message: &Value) -> Result<(), ValidationError> {
    traverse(message, 0, 0)
}

fn traverse(item: &Value, depth: usize, call_depth: usize) -> Result<(), ValidationError> {
    if depth > MAX_STRUCTURAL_DEPTH {
        return Err(RecursionLimitError::StructuralDepth {
            limit: MAX_STRUCTURAL_DEPTH,
        }
        .into());
    }

    match item {
        Value::Array(items) => items.iter().try_for_each(|x| traverse(x, depth + 1, call_depth)),
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get(PATH_KEY) {
                if !is_valid_json_pointer(path) {
                    return Err(ValidationError::PathSyntax { path: path.clone() });
                }
            }

            let is_call = map.contains_key(CALL_KEY) && map.contains_key(ARGS_KEY);
            if is_call && call_depth >= MAX_FUNCTION_CALL_DEPTH {
                return Err(RecursionLimitError::FunctionCallDepth {
                    limit: MAX_FUNCTION_CALL_DEPTH,
                }
                .into());
            }

            for (key, value) in map {
                let next_call_depth = if is_call && key == ARGS_KEY {
                    call_depth + 1
                } else {
                    call_depth
                };
                traverse(value, depth + 1, next_call_depth)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// `levels` function calls, each nested inside the previous one's args.
    fn nested_calls(levels: usize) -> Value {
        let mut value = json!({ "call": "leaf", "args": {} });
        for _ in 1..levels {
            value = json!({ "call": "wrap", "args": { "functionCall": value } });
        }
        json!({ "updateDataModel": { "value": value } })
    }

    #[test]
    fn test_five_nested_calls_pass() {
        assert!(check_recursion_and_paths(&nested_calls(5)).is_ok());
    }

    #[test]
    fn test_six_nested_calls_fail() {
        let err = check_recursion_and_paths(&nested_calls(6)).unwrap_err();
        assert_eq!(err.to_string(), "Recursion limit exceeded: functionCall depth > 5");
    }

    #[test]
    fn test_structural_depth_ceiling() {
        let mut value = json!("leaf");
        for _ in 0..MAX_STRUCTURAL_DEPTH {
            value = json!([value]);
        }
        assert!(check_recursion_and_paths(&value).is_ok());

        let too_deep = json!([value]);
        let err = check_recursion_and_paths(&too_deep).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::RecursionLimit(RecursionLimitError::StructuralDepth { limit: 50 })
        ));
    }

    #[test]
    fn test_path_values_follow_pointer_grammar() {
        assert!(check_recursion_and_paths(&json!({ "value": { "path": "/a/b" } })).is_ok());
        assert!(check_recursion_and_paths(&json!({ "value": { "path": "/a//b" } })).is_ok());

        let message = json!({ "value": { "path": "not-a-pointer" } });
        let err = check_recursion_and_paths(&message).unwrap_err();
        assert_eq!(err, ValidationError::PathSyntax { path: "not-a-pointer".into() });
    }

    #[test]
    fn test_non_string_path_is_ignored() {
        assert!(check_recursion_and_paths(&json!({ "path": { "nested": 1 } })).is_ok());
    }
}
