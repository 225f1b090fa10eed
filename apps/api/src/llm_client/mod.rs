/// LLM Client — the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// Callers depend on the `CompletionClient` trait so tests can script replies.
///
/// Speaks the OpenAI-compatible `/chat/completions` protocol. One attempt per call:
/// failures surface to the caller unchanged.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model for ask requests; overridable with `OPENAI_MODEL`.
pub const DEFAULT_MODEL: &str = "gpt-4";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the message list sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sends an ordered message list and returns the raw completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn submit(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl CompletionResponse {
    /// Extracts the text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pulls `error.message` out of an error body, falling back to the raw body.
fn extract_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// HTTP implementation of `CompletionClient`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn submit(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(body);
            warn!("Completion API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_serialize_with_lowercase_roles() {
        let messages = [ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let body = serde_json::to_value(CompletionRequest {
            model: DEFAULT_MODEL,
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ]
            })
        );
    }

    #[test]
    fn test_completion_text_from_first_choice() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "::Section:: 7"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), Some("::Section:: 7"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn test_completion_text_missing_or_empty() {
        let none: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(none.text(), None);

        let null: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(null.text(), None);

        let empty: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": ""}}]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn test_extract_error_message_from_envelope() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            extract_error_message(body.to_string()),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(
            extract_error_message("upstream timeout".to_string()),
            "upstream timeout"
        );
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = LlmClient::new("key".to_string(), "http://localhost:11434/v1/").unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
    }
}
