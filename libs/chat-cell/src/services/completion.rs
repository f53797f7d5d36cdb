use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{ChatError, ChatMessage, ChatRole};

pub const COMPLETION_TEMPERATURE: f64 = 0.7;
pub const COMPLETION_MAX_TOKENS: u32 = 1024;

pub const EMPTY_COMPLETION_TEXT: &str = "I apologize, but I could not generate a response.";

/// Free-text fallback used by the agents when no canned answer applies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, ChatError>;
}

/// OpenAI-compatible chat completions endpoint (Groq by default).
#[derive(Debug)]
pub struct GroqCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl GroqCompletionClient {
    pub fn new(config: &AppConfig) -> Result<Self, ChatError> {
        if !config.is_llm_configured() {
            return Err(ChatError::Completion("GROQ_API_KEY is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| ChatError::Completion(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.groq_base_url.trim_end_matches('/').to_string(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for GroqCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, ChatError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(ChatRole::System, system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::new(ChatRole::User, message));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": COMPLETION_TEMPERATURE,
            "max_tokens": COMPLETION_MAX_TOKENS,
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {} with {} messages", url, messages.len());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API error ({}): {}", status, error_text);
            return Err(ChatError::Completion(format!("status {}", status.as_u16())));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Completion(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION_TEXT.to_string()))
    }
}
