//! LLM Provider Client
//!
//! HTTP client for an OpenAI-compatible chat-completions endpoint. The
//! deployed provider is OpenRouter, but any endpoint speaking the same wire
//! format works.
//!
//! Configuration (environment variables):
//! - `LLM_API_KEY`: provider API key; unset leaves the client unconfigured
//!   and callers fall back to the keyword matcher
//! - `LLM_API_URL`: chat-completions endpoint URL
//! - `LLM_MODEL`: model identifier, e.g. "openai/gpt-3.5-turbo"
//!
//! Transient failures (429, 5xx, transport errors) retry with exponential
//! backoff; client errors do not.

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(1000);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    /// Total retry budget per call.
    pub max_elapsed: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            api_url: std::env::var("LLM_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
            max_elapsed: defaults.max_elapsed,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider is not configured (missing API key)")]
    NotConfigured,
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM provider returned status {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("LLM response contained no choices")]
    EmptyResponse,
}

impl LlmError {
    /// Rate limits, server errors, and transport failures may succeed on
    /// retry; everything else is permanent for this call.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Provider { status, .. } => *status == 429 || *status >= 500,
            LlmError::NotConfigured | LlmError::EmptyResponse => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn from_env() -> Self {
        Self::new(LlmConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(INITIAL_RETRY_DELAY)
            .with_max_interval(MAX_RETRY_DELAY)
            .with_max_elapsed_time(Some(self.config.max_elapsed))
            .build()
    }

    /// One chat turn: system prompt plus user message, assistant text back.
    pub async fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::NotConfigured)?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
        };

        let mut backoff = self.create_backoff();
        loop {
            match self.send(api_key, &request).await {
                Ok(answer) => return Ok(answer),
                Err(err) if err.is_retryable() => match backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!("LLM call failed ({}), retrying in {:?}", err, delay);
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!("LLM retry budget exhausted: {}", err);
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<String, LlmError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}
