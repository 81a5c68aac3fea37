//! # Payload Repair Step
//!
//! One deterministic textual repair in front of the conformance validator.
//! Parse and validate; on failure strip trailing commas from the original
//! text and try exactly once more. The second failure is returned as is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::PayloadError;
use crate::validate::ConformanceValidator;

/// A comma followed by optional whitespace and a closing `]` or `}`.
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[\]}])").expect("trailing comma pattern compiles"));

/// Parses, validates and, if needed, repairs raw generator output.
#[derive(Debug)]
pub struct PayloadFixer {
    validator: ConformanceValidator,
}

impl PayloadFixer {
    pub fn new(validator: ConformanceValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &ConformanceValidator {
        &self.validator
    }

    /// Remove every comma that directly precedes a closing bracket or brace.
    pub fn remove_trailing_commas(text: &str) -> String {
        let fixed = TRAILING_COMMA.replace_all(text, "$1").into_owned();
        if fixed != text {
            tracing::warn!("detected trailing commas in generated payload; applied autofix");
        }
        fixed
    }

    /// Return the parsed, validated message list, repairing trailing commas
    /// once if the first attempt fails.
    pub fn validate_and_fix(&self, raw: &str) -> Result<Vec<Value>, PayloadError> {
        match self.parse_and_validate(raw) {
            Ok(messages) => Ok(messages),
            Err(first) => {
                tracing::warn!(error = %first, "initial payload validation failed");
                let repaired = Self::remove_trailing_commas(raw);
                self.parse_and_validate(&repaired)
            }
        }
    }

    fn parse_and_validate(&self, text: &str) -> Result<Vec<Value>, PayloadError> {
        let messages = parse_messages(text)?;
        let payload = Value::Array(messages);
        self.validator.validate(&payload)?;
        match payload {
            Value::Array(messages) => Ok(messages),
            other => Ok(vec![other]),
        }
    }
}

/// Parse `text` as JSON, wrapping a single value into a one-element list.
pub fn parse_messages(text: &str) -> Result<Vec<Value>, PayloadError> {
    match serde_json::from_str::<Value>(text).map_err(PayloadError::Parse)? {
        Value::Array(messages) => Ok(messages),
        single => {
            tracing::info!("received a single JSON object; wrapping in a list for validation");
            Ok(vec![single])
        }
    }
}
