//! Wire types for the relay's own `/translate` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notes used whenever the model did not supply any.
pub const DEFAULT_NOTE: &str = "No additional notes provided.";

/// Error label for every failure that happens after the input was accepted.
pub const TRANSLATION_ERROR: &str = "Error during translation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// A string, a structured object, or `null` when the model's JSON omitted it.
    pub arabic_translation: Value,
    pub translation_notes: Vec<Value>,
}

impl TranslationResult {
    pub fn new(arabic_translation: Value, translation_notes: Vec<Value>) -> Self {
        Self {
            arabic_translation,
            translation_notes,
        }
    }

    pub fn default_notes() -> Vec<Value> {
        vec![Value::String(DEFAULT_NOTE.to_string())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn translation_failed(details: impl Into<String>) -> Self {
        Self::new(TRANSLATION_ERROR).with_details(details)
    }

    pub fn unauthorized() -> Self {
        Self::new("Unauthorized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serializes_both_keys() {
        let result = TranslationResult::new(Value::Null, TranslationResult::default_notes());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "arabic_translation": null,
                "translation_notes": ["No additional notes provided."]
            })
        );
    }

    #[test]
    fn test_error_without_details_omits_key() {
        let json = serde_json::to_value(ErrorResponse::new("englishContent is required")).unwrap();
        assert_eq!(json, json!({"error": "englishContent is required"}));
    }

    #[test]
    fn test_translation_failed() {
        let err = ErrorResponse::translation_failed("connection refused");
        assert_eq!(err.error, "Error during translation");
        assert_eq!(err.details.as_deref(), Some("connection refused"));
    }
}
