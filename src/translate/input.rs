//! Normalize the inbound `/translate` body into a single piece of content.
//!
//! Three body shapes are accepted: a direct `englishContent` string, the same
//! field carrying JSON (either stringified or already parsed), and the nested
//! workflow payload `payload.translations.update[0].content` sent by CMS
//! automation tools. Shape detection happens once, in [`InputShape::detect`].

use serde_json::Value;

use crate::error::{RelayError, Result};

pub const CONTENT_FIELD: &str = "englishContent";
pub const WORKFLOW_PATH: &str = "payload.translations.update[0].content";

const MISSING_CONTENT: &str = "englishContent is required";

/// Content extracted from one request, ready to embed in a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedContent {
    Text(String),
    Structured(Value),
}

/// The body shapes the relay understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InputShape {
    /// `englishContent` is a string; it may still hold stringified JSON.
    RawString(String),
    /// `englishContent` was sent as a JSON object or array.
    ParsedStructured(Value),
    /// The nested workflow payload, with the content value at its leaf.
    WorkflowPayload(Value),
}

impl InputShape {
    pub fn detect(body: &Value) -> Result<Self> {
        let obj = body.as_object().ok_or_else(|| {
            RelayError::invalid_input("Request body must be a JSON object", json_type(body))
        })?;

        // A null field counts as absent so the payload branch can still apply.
        if let Some(candidate) = obj.get(CONTENT_FIELD).filter(|v| !v.is_null()) {
            return match candidate {
                Value::String(s) => Ok(Self::RawString(s.clone())),
                Value::Object(_) | Value::Array(_) => Ok(Self::ParsedStructured(candidate.clone())),
                other => Err(unsupported_type(CONTENT_FIELD, other)),
            };
        }

        if let Some(payload) = obj.get("payload") {
            return workflow_content(payload).map(|v| Self::WorkflowPayload(v.clone()));
        }

        Err(RelayError::missing_input(MISSING_CONTENT))
    }
}

/// Parse raw body bytes and normalize them.
pub fn normalize_body(body: &[u8]) -> Result<NormalizedContent> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RelayError::invalid_input("Invalid JSON format in request body", e.to_string()))?;
    normalize(&value)
}

pub fn normalize(body: &Value) -> Result<NormalizedContent> {
    match InputShape::detect(body)? {
        InputShape::RawString(text) => normalize_text(text, CONTENT_FIELD, MISSING_CONTENT),
        InputShape::ParsedStructured(value) => Ok(NormalizedContent::Structured(value)),
        InputShape::WorkflowPayload(value) => match value {
            Value::String(text) => {
                normalize_text(text, WORKFLOW_PATH, &format!("{WORKFLOW_PATH} is required"))
            }
            Value::Object(_) | Value::Array(_) => Ok(NormalizedContent::Structured(value)),
            Value::Null => Err(RelayError::missing_input(format!("{WORKFLOW_PATH} is required"))),
            other => Err(unsupported_type(WORKFLOW_PATH, &other)),
        },
    }
}

/// Stringified JSON is unpacked; anything else stays plain text.
fn normalize_text(text: String, field: &str, missing: &str) -> Result<NormalizedContent> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RelayError::missing_input(missing));
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map(NormalizedContent::Structured)
            .map_err(|e| {
                RelayError::invalid_input(format!("Invalid JSON format in {field}"), e.to_string())
            });
    }

    Ok(NormalizedContent::Text(text))
}

fn unsupported_type(field: &str, value: &Value) -> RelayError {
    RelayError::invalid_input(
        format!("{field} must be a string, object or array"),
        format!("got {}", json_type(value)),
    )
}

fn workflow_content(payload: &Value) -> Result<&Value> {
    let missing = |segment: &str| {
        RelayError::missing_input(format!("{WORKFLOW_PATH} is required (missing '{segment}')"))
    };

    let translations = payload.get("translations").ok_or_else(|| missing("translations"))?;
    let update = translations
        .get("update")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("update"))?;
    let first = update.first().ok_or_else(|| missing("update[0]"))?;
    first.get("content").ok_or_else(|| missing("content"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
