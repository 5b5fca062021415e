//! One translation request, start to finish.

use std::fmt;

use crate::config::{Credentials, RelayConfig};
use crate::error::{RelayError, Result};
use crate::logging::SharedLogger;
use crate::translate::input::{normalize_body, NormalizedContent};
use crate::translate::openai_types::ChatCompletionRequest;
use crate::translate::prompt::build_completion_request;
use crate::translate::reconcile::reconcile;
use crate::translate::relay_types::TranslationResult;
use crate::upstream;

/// Request lifecycle. Phases only move forward; any error in the first three
/// ends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normalizing,
    PromptBuilding,
    AwaitingUpstream,
    Reconciling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalizing => "normalizing",
            Self::PromptBuilding => "prompt_building",
            Self::AwaitingUpstream => "awaiting_upstream",
            Self::Reconciling => "reconciling",
        };
        f.write_str(name)
    }
}

/// A failed request together with the phase it failed in.
#[derive(Debug)]
pub struct Failed {
    pub phase: Phase,
    pub error: RelayError,
}

impl Failed {
    fn at(phase: Phase) -> impl FnOnce(RelayError) -> Self {
        move |error| Self { phase, error }
    }
}

/// Run the full normalize → prompt → upstream → reconcile pipeline for one body.
pub async fn translate(
    body: &[u8],
    config: &RelayConfig,
    credentials: &Credentials,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> std::result::Result<TranslationResult, Failed> {
    logger.debug("relay", format!("phase={}", Phase::Normalizing));
    let content = normalize_body(body).map_err(Failed::at(Phase::Normalizing))?;
    logger.info("relay", describe(&content));

    logger.debug("relay", format!("phase={}", Phase::PromptBuilding));
    let request = build_completion_request(&content, &config.upstream, config.prompt.schema);

    logger.debug("relay", format!("phase={}", Phase::AwaitingUpstream));
    let text = call_upstream(&request, config, credentials, client, logger)
        .await
        .map_err(Failed::at(Phase::AwaitingUpstream))?;

    logger.debug("relay", format!("phase={}", Phase::Reconciling));
    let reconciled = reconcile(&text);
    if reconciled.is_fallback() {
        logger.warn(
            "relay",
            format!(
                "ReconciliationFallback: model reply was not a JSON object ({} bytes), returning raw text",
                text.len()
            ),
        );
    }

    Ok(reconciled.into_result())
}

async fn call_upstream(
    request: &ChatCompletionRequest,
    config: &RelayConfig,
    credentials: &Credentials,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> Result<String> {
    let url = config.upstream.completions_url();
    upstream::complete(request, &url, &credentials.api_key, client, logger).await
}

fn describe(content: &NormalizedContent) -> String {
    match content {
        NormalizedContent::Text(text) => format!("Content: text chars={}", text.chars().count()),
        NormalizedContent::Structured(value) => {
            let kind = if value.is_array() { "array" } else { "object" };
            format!("Content: structured {}", kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;
    use tempfile::TempDir;

    fn credentials() -> Credentials {
        Credentials {
            api_key: "sk-test".to_string(),
            basic_auth: None,
        }
    }

    fn config_for(base_url: String) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.upstream.base_url = base_url;
        config
    }

    #[tokio::test]
    async fn test_input_failure_stops_before_upstream() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let logger = SharedLogger::new(dir.path().join("relay.log")).unwrap();
        let failed = translate(
            br#"{"other": 1}"#,
            &config_for(server.url()),
            &credentials(),
            &reqwest::Client::new(),
            &logger,
        )
        .await
        .unwrap_err();

        mock.assert_async().await;
        assert_eq!(failed.phase, Phase::Normalizing);
        assert!(matches!(failed.error, RelayError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn test_fallback_is_logged() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"مرحبا"}}]}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let logger = SharedLogger::new(dir.path().join("relay.log")).unwrap();
        let result = translate(
            br#"{"englishContent": "Hello"}"#,
            &config_for(server.url()),
            &credentials(),
            &reqwest::Client::new(),
            &logger,
        )
        .await
        .unwrap();

        assert_eq!(result.arabic_translation, json!("مرحبا"));
        assert!(logger
            .recent(20)
            .iter()
            .any(|e| e.message.starts_with("ReconciliationFallback")));
    }

    #[tokio::test]
    async fn test_upstream_failure_phase() {
        let dir = TempDir::new().unwrap();
        let logger = SharedLogger::new(dir.path().join("relay.log")).unwrap();
        let failed = translate(
            br#"{"englishContent": "Hello"}"#,
            &config_for("http://127.0.0.1:1".to_string()),
            &credentials(),
            &reqwest::Client::new(),
            &logger,
        )
        .await
        .unwrap_err();

        assert_eq!(failed.phase, Phase::AwaitingUpstream);
        assert_eq!(failed.error.kind(), "UpstreamFailure");
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::AwaitingUpstream.to_string(), "awaiting_upstream");
    }
}
