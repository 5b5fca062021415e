//! Render the translation instructions sent to the completion API.

use serde::{Deserialize, Serialize};

use super::input::NormalizedContent;
use super::openai_types::{ChatCompletionRequest, ChatMessage};
use crate::config::UpstreamConfig;

/// Output shape the model is asked to reply with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSchema {
    /// Free text; no JSON is requested.
    Text,
    /// `{"arabic_translation": "...", "translation_notes": [...]}`
    #[default]
    Flat,
    /// Nested CMS structure with `title`, `image_position` and `translations.create[]`.
    Workflow,
}

const PREAMBLE: &str = "You are an expert translator specializing in English to Arabic translations. \
Your task is to provide an accurate and natural-sounding translation while preserving the original meaning and tone of the text.";

const BASE_RULES: &str = "1. Translate the content into Modern Standard Arabic (فصحى), ensuring grammatical correctness.
2. Keep proper nouns, brand names, and technical terms in their original form.";

const FORMAT_RULES: &str = "3. Preserve the original formatting, including HTML tags, Markdown, line breaks and JSON keys. Translate only human-readable text.
4. Do not translate URLs, file names, identifiers or numeric values.
5. Record any ambiguity, cultural adaptation or untranslated term in translation_notes.
6. Reply with a single JSON object only, with no surrounding commentary or code fences.";

const FLAT_SCHEMA: &str = r#"{
  "arabic_translation": "<the full Arabic translation>",
  "translation_notes": ["<note>", "..."]
}"#;

const WORKFLOW_SCHEMA: &str = r#"{
  "arabic_translation": {
    "title": "<translated title>",
    "image_position": "<copied unchanged from the source>",
    "translations": {
      "create": [
        {
          "locale": "ar",
          "title": "<translated title>",
          "content": "<translated content with the original markup preserved>"
        }
      ]
    }
  },
  "translation_notes": ["<note>", "..."]
}"#;

impl PromptSchema {
    fn output_schema(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Flat => Some(FLAT_SCHEMA),
            Self::Workflow => Some(WORKFLOW_SCHEMA),
        }
    }
}

impl NormalizedContent {
    /// Text embedded in the prompt: structured values as indented JSON.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

pub fn render_prompt(content: &NormalizedContent, schema: PromptSchema) -> String {
    let mut prompt = format!(
        "{PREAMBLE}\n\nHere is the English content to be translated:\n\n<english_content>\n{}\n</english_content>\n\nPlease follow these instructions carefully:\n{BASE_RULES}\n",
        content.to_prompt_text()
    );

    if let Some(output_schema) = schema.output_schema() {
        prompt.push_str(FORMAT_RULES);
        prompt.push_str("\n\nRespond using exactly this JSON structure:\n");
        prompt.push_str(output_schema);
        prompt.push('\n');
    }

    prompt
}

/// Build the single-message completion request for one translation.
pub fn build_completion_request(
    content: &NormalizedContent,
    upstream: &UpstreamConfig,
    schema: PromptSchema,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: upstream.model.clone(),
        messages: vec![ChatMessage::system(render_prompt(content, schema))],
        temperature: upstream.temperature,
        max_tokens: upstream.max_tokens,
    }
}
