//! Turn the model's free-form reply into the relay's response envelope.

use serde_json::Value;

use super::relay_types::TranslationResult;

/// What the model's reply turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// The reply parsed as a JSON object.
    Structured(serde_json::Map<String, Value>),
    /// The reply was not a JSON object; the raw text becomes the translation.
    Fallback(String),
}

impl Reconciled {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn into_result(self) -> TranslationResult {
        match self {
            Self::Structured(mut obj) => {
                let translation = obj.remove("arabic_translation").unwrap_or(Value::Null);
                let notes = match obj.remove("translation_notes") {
                    Some(Value::Array(notes)) => notes,
                    Some(Value::String(note)) => vec![Value::String(note)],
                    _ => TranslationResult::default_notes(),
                };
                TranslationResult::new(translation, notes)
            }
            Self::Fallback(text) => {
                TranslationResult::new(Value::String(text), TranslationResult::default_notes())
            }
        }
    }
}

pub fn reconcile(text: &str) -> Reconciled {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Reconciled::Structured(obj),
        _ => Reconciled::Fallback(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_falls_back() {
        let reconciled = reconcile("مرحبا");
        assert!(reconciled.is_fallback());
        let result = reconciled.into_result();
        assert_eq!(result.arabic_translation, json!("مرحبا"));
        assert_eq!(result.translation_notes, vec![json!("No additional notes provided.")]);
    }

    #[test]
    fn test_well_formed_reply_passes_through() {
        let result = reconcile(r#"{"arabic_translation": "X", "translation_notes": ["note1"]}"#)
            .into_result();
        assert_eq!(result.arabic_translation, json!("X"));
        assert_eq!(result.translation_notes, vec![json!("note1")]);
    }

    #[test]
    fn test_structured_translation_passes_through() {
        let reply = json!({
            "arabic_translation": {"title": "عنوان", "translations": {"create": [{"content": "<p>نص</p>"}]}},
            "translation_notes": []
        });
        let result = reconcile(&reply.to_string()).into_result();
        assert_eq!(result.arabic_translation, reply["arabic_translation"]);
        assert!(result.translation_notes.is_empty());
    }

    #[test]
    fn test_missing_notes_get_default() {
        let result = reconcile(r#"{"arabic_translation": "X"}"#).into_result();
        assert_eq!(result.translation_notes, TranslationResult::default_notes());
    }

    #[test]
    fn test_single_string_note_is_wrapped() {
        let result =
            reconcile(r#"{"arabic_translation": "X", "translation_notes": "one"}"#).into_result();
        assert_eq!(result.translation_notes, vec![json!("one")]);
    }

    #[test]
    fn test_missing_translation_is_null() {
        let result = reconcile(r#"{"translation_notes": ["n"]}"#).into_result();
        assert_eq!(result.arabic_translation, Value::Null);
        assert_eq!(result.translation_notes, vec![json!("n")]);
    }

    #[test]
    fn test_non_string_notes_are_kept() {
        let result =
            reconcile(r#"{"arabic_translation": "X", "translation_notes": [1, {"k": "v"}]}"#)
                .into_result();
        assert_eq!(result.translation_notes, vec![json!(1), json!({"k": "v"})]);
    }

    #[test]
    fn test_json_scalar_falls_back() {
        let reconciled = reconcile("\"مرحبا\"");
        assert_eq!(reconciled, Reconciled::Fallback("\"مرحبا\"".to_string()));
    }

    #[test]
    fn test_truncated_json_falls_back() {
        let text = r#"{"arabic_translation": "نص"#;
        let result = reconcile(text).into_result();
        assert_eq!(result.arabic_translation, json!(text));
    }
}
