//! OpenAI-compatible chat completion plumbing shared by both backends.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::ModelError;

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn user(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }
}

pub(crate) fn build_http_client(timeout_ms: u64) -> Result<Client, ModelError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| ModelError::Http(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn completions_url(base_url: &str) -> String {
    if base_url.ends_with("/chat/completions") {
        base_url.to_string()
    } else {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

/// Pull the first choice's message content out of a completion response.
pub fn parse_chat_completion(response: &Value) -> Result<String, ModelError> {
    let choices = response
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| ModelError::ParseError("response has no choices array".to_string()))?;

    let content = choices
        .first()
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::trim)
        .unwrap_or("");

    if content.is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(content.to_string())
}

/// POST a chat request, retrying with exponential backoff.
pub(crate) async fn post_with_retries(
    http: &Client,
    url: &str,
    api_key: Option<&str>,
    request: &ChatRequest<'_>,
    attempts: u32,
    base_delay_ms: u64,
) -> Result<String, ModelError> {
    let attempts = attempts.max(1);
    let mut last_err: Option<ModelError> = None;

    for i in 0..attempts {
        if i > 0 {
            let delay_ms = base_delay_ms.saturating_mul(1u64 << (i - 1).min(10));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match post_once(http, url, api_key, request).await {
            Ok(answer) => return Ok(answer),
            Err(e) => {
                tracing::error!(
                    "Model call to {} failed (attempt {}/{}): {}",
                    request.model,
                    i + 1,
                    attempts,
                    e
                );
                last_err = Some(e);
            }
        }
    }

    Err(ModelError::RetriesExhausted {
        attempts,
        last: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

async fn post_once(
    http: &Client,
    url: &str,
    api_key: Option<&str>,
    request: &ChatRequest<'_>,
) -> Result<String, ModelError> {
    let mut builder = http.post(url).json(request);
    if let Some(key) = api_key {
        builder = builder.bearer_auth(key);
    }
    let resp = builder
        .send()
        .await
        .map_err(|e| ModelError::Http(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ModelError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    let value: Value = resp
        .json()
        .await
        .map_err(|e| ModelError::ParseError(format!("non-JSON response: {e}")))?;
    if let Some(usage) = value.get("usage") {
        tracing::debug!("Token usage for {}: {}", request.model, usage);
    }
    let answer = parse_chat_completion(&value)?;
    tracing::debug!("Model response received (length: {} chars)", answer.len());
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_choice_content() {
        let resp = json!({"choices": [{"message": {"content": "  Probability: 40%\n"}}]});
        assert_eq!(parse_chat_completion(&resp).unwrap(), "Probability: 40%");
    }

    #[test]
    fn null_content_is_empty_response() {
        let resp = json!({"choices": [{"message": {"content": null}}]});
        assert!(matches!(
            parse_chat_completion(&resp),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            parse_chat_completion(&json!({"error": "overloaded"})),
            Err(ModelError::ParseError(_))
        ));
    }

    #[test]
    fn request_omits_unset_temperature() {
        let req = ChatRequest::user("m", "hi");
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn completions_url_is_appended_once() {
        assert_eq!(
            completions_url("http://localhost:8000/v1/"),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://x/v1/chat/completions"),
            "http://x/v1/chat/completions"
        );
    }
}
