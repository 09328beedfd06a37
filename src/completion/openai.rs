//! HTTP client for OpenAI-compatible chat-completion endpoints.
//!
//! Configuration is via environment variables:
//! - `COURSEGEN_COMPLETIONS_URL` - Endpoint (default: OpenAI chat completions)
//! - `COURSEGEN_API_KEY` - Bearer token, falls back to `OPENAI_API_KEY`
//! - `COURSEGEN_MODEL` - Model identifier (default: `gpt-4o-mini`)
//! - `COURSEGEN_TIMEOUT_SECS` - Per-call timeout (default: 120)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionError};

const DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound on a single round trip. Upstream latency is otherwise unbounded.
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let url = std::env::var("COURSEGEN_COMPLETIONS_URL")
            .unwrap_or_else(|_| DEFAULT_URL.to_string());

        let api_key = std::env::var("COURSEGEN_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();

        let model =
            std::env::var("COURSEGEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("COURSEGEN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Create a config pointing at `url` (for testing against a mock server).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion client backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: CompletionConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create client from environment variables.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::new(CompletionConfig::from_env())
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending completion request"
        );

        let mut req = self.client.post(&self.config.url).json(&body);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::NoChoices)
    }
}
