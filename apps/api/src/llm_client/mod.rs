/// LLM Client — the single point of entry for completion API calls.
///
/// No other module may call the completion API directly. Callers depend on
/// the [`CompletionService`] trait so the transport can be swapped, wrapped
/// in a [`RetryingClient`], or mocked in tests.
///
/// This layer performs exactly one request per call: no retry, no timeout.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
pub mod mock;
pub mod retry;

pub use retry::{RetryPolicy, RetryingClient};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Transport-level failure of the evaluation service.
///
/// A completion whose *content* is not the expected JSON is not an
/// `UpstreamError`; that is handled by the normalizer.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Response (status {status}) has no completion content: {body}")]
    MalformedCompletion { status: u16, body: String },
}

impl UpstreamError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Http(e) => e.status().map(|s| s.as_u16()),
            UpstreamError::Api { status, .. } | UpstreamError::MalformedCompletion { status, .. } => {
                Some(*status)
            }
        }
    }

    /// Connection failures, 429 and 5xx may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Http(_) => true,
            UpstreamError::Api { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::MalformedCompletion { .. } => false,
        }
    }
}

/// The first completion of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Token accounting. Diagnostic only; a missing count reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a system/user message pair and returns the first completion's text.
    async fn evaluate(&self, prompt: &str, system: &str) -> Result<ModelResponse, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default, deserialize_with = "lenient_usage")]
    usage: Option<Usage>,
}

/// A `usage` block of any unexpected shape is dropped rather than failing the reply.
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<Usage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

/// Chat-completions client for OpenAI-compatible APIs.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn evaluate(&self, prompt: &str, system: &str) -> Result<ModelResponse, UpstreamError> {
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let parsed = parse_completion(status, body)?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(parsed)
    }
}

/// Maps a status and body to the first completion, or an [`UpstreamError`]
/// when the status is not 2xx or `choices[0].message.content` is absent.
fn parse_completion(status: u16, body: String) -> Result<ModelResponse, UpstreamError> {
    if !(200..300).contains(&status) {
        return Err(UpstreamError::Api { status, body });
    }

    let parsed = match serde_json::from_str::<ChatResponse>(&body) {
        Ok(parsed) => parsed,
        Err(_) => return Err(UpstreamError::MalformedCompletion { status, body }),
    };

    let usage = parsed.usage;
    match parsed.choices.into_iter().next().and_then(|c| c.message.content) {
        Some(content) => Ok(ModelResponse { content, usage }),
        None => Err(UpstreamError::MalformedCompletion { status, body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_returns_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"matchPercentage\": 85}"}},
                {"index": 1, "message": {"role": "assistant", "content": "second"}}
            ],
            "usage": {"prompt_tokens": 900, "completion_tokens": 300, "total_tokens": 1200}
        }"#;

        let response = parse_completion(200, body.to_string()).unwrap();
        assert_eq!(response.content, "{\"matchPercentage\": 85}");
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 900,
                completion_tokens: 300
            })
        );
    }

    #[test]
    fn test_parse_completion_non_json_content_is_not_an_error() {
        let body = r#"{"choices": [{"message": {"content": "Candidate matches 40%"}}]}"#;
        let response = parse_completion(200, body.to_string()).unwrap();
        assert_eq!(response.content, "Candidate matches 40%");
        assert_eq!(response.usage, None);
    }

    #[test]
    fn test_parse_completion_tolerates_partial_usage() {
        let body = r#"{
            "choices": [{"message": {"content": "{\"matchPercentage\": 70}"}}],
            "usage": {"prompt_tokens": 12}
        }"#;
        let response = parse_completion(200, body.to_string()).unwrap();
        assert_eq!(response.content, "{\"matchPercentage\": 70}");
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 12,
                completion_tokens: 0
            })
        );

        let body = r#"{"choices": [{"message": {"content": "ok"}}], "usage": "n/a"}"#;
        let response = parse_completion(200, body.to_string()).unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(response.usage, None);
    }

    #[test]
    fn test_parse_completion_server_error() {
        let err = parse_completion(500, "internal error".to_string()).unwrap_err();
        assert!(matches!(err, UpstreamError::Api { status: 500, ref body } if body == "internal error"));
        assert_eq!(err.status_code(), Some(500));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_completion_client_error_not_retryable() {
        let err = parse_completion(401, r#"{"error": {"message": "bad key"}}"#.to_string())
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_completion_missing_path() {
        for body in [
            r#"{"choices": []}"#,
            r#"{"object": "list"}"#,
            r#"{"choices": [{"message": {"content": null}}]}"#,
            "<html>gateway</html>",
        ] {
            let err = parse_completion(200, body.to_string()).unwrap_err();
            assert!(
                matches!(err, UpstreamError::MalformedCompletion { status: 200, .. }),
                "body {body} should be malformed"
            );
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = parse_completion(429, String::new()).unwrap_err();
        assert!(err.is_retryable());
    }
}
