use crate::error::{RelayError, Result};
use crate::logging::SharedLogger;
use crate::translate::openai_types::{ChatCompletionRequest, ChatCompletionResponse, ChatErrorResponse};

/// Send one non-streaming chat completion and return the trimmed
/// `choices[0].message.content`.
///
/// Every failure, whether transport, status or envelope, becomes
/// [`RelayError::UpstreamFailure`]. Nothing is retried.
pub async fn complete(
    req: &ChatCompletionRequest,
    url: &str,
    api_key: &str,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> Result<String> {
    logger.info("upstream", format!("POST {} model={}", url, req.model));

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(req)
        .send()
        .await
        .map_err(|e| RelayError::upstream(format!("Request failed: {}", e)))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| RelayError::upstream(format!("Failed to read response body: {}", e)))?;

    logger.debug(
        "upstream",
        format!("Response status={} body_len={}", status, body.len()),
    );

    if status >= 400 {
        if let Ok(err) = serde_json::from_str::<ChatErrorResponse>(&body) {
            logger.warn("upstream", format!("Provider error: {}", err.error.message));
            return Err(RelayError::upstream(format!(
                "Provider returned status {}: {}",
                status, err.error.message
            )));
        }

        return Err(RelayError::upstream(format!(
            "Provider returned status {}: {}",
            status,
            truncate(&body, 500)
        )));
    }

    let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
        RelayError::upstream(format!(
            "Failed to parse provider response: {}. Body: {}",
            e,
            truncate(&body, 300)
        ))
    })?;

    let content = completion
        .first_content()
        .ok_or_else(|| RelayError::upstream("Provider response has no message content"))?;

    if let Some(usage) = &completion.usage {
        logger.info(
            "upstream",
            format!(
                "Completed: in={} out={} tokens",
                usage.prompt_tokens, usage.completion_tokens
            ),
        );
    }

    Ok(content.trim().to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
