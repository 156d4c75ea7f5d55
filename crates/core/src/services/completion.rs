//! Chat-completion client for the quiz features.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. The concrete
//! provider is configuration; the default points at Groq.

use async_trait::async_trait;
use careride_common::{AppError, AppResult, QuizConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message role in a chat-completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in a chat-completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion provider trait.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run a completion over the given messages and return the assistant's
    /// reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> AppResult<String>;
}

/// Configuration for the completion client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Endpoint URL (OpenAI-compatible chat completions).
    pub url: String,
    /// Model name.
    pub model: String,
    /// Bearer API key.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl From<&QuizConfig> for CompletionConfig {
    fn from(config: &QuizConfig) -> Self {
        Self {
            url: config.completion_url.clone(),
            model: config.completion_model.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// HTTP completion client.
#[derive(Clone)]
pub struct CompletionClient {
    config: CompletionConfig,
    http_client: reqwest::Client,
}

impl CompletionClient {
    /// Create a new completion client.
    #[must_use]
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatCompletion for CompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> AppResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Completion API key not configured".to_string()))?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        });

        let response = self
            .http_client
            .post(&self.config.url)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Completion API error: {status} - {body}"
            )));
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<CompletionChoice>,
        }

        #[derive(Deserialize)]
        struct CompletionChoice {
            message: CompletionMessage,
        }

        #[derive(Deserialize)]
        struct CompletionMessage {
            content: String,
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse completion response: {e}"))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalService("No completion returned".to_string()))?
            .message
            .content
            .trim()
            .to_string();

        Ok(content)
    }
}
