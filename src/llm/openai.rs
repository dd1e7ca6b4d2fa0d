//! OpenAI API integration.
//!
//! Implements the LlmProvider trait for OpenAI chat completion models.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmError, LlmProvider, ProviderConfig, DEFAULT_OPENAI_MODEL, REQUEST_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_MAX_TOKENS: u32 = 15_000;

/// OpenAI API provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create from resolved provider settings.
    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured("OpenAI API key is required".to_string()))?;

        let provider = Self {
            client: Client::new(),
            api_key,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        Ok(match &config.base_url {
            Some(url) => provider.with_base_url(url.clone()),
            None => provider,
        })
    }

    /// Create with a custom base URL (for OpenAI-compatible APIs).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn generate_text(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: Some(self.model.clone()),
            messages: chat_messages(prompt, system),
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("Failed to generate text using OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status("OpenAI", &self.model, status, &body).into());
        }

        let response: ChatResponse =
            response.json().await.context("Invalid response from OpenAI API")?;
        response.into_text("OpenAI")
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// System message (when given) followed by the user prompt.
pub(super) fn chat_messages(prompt: &str, system: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(ChatMessage { role: "system".to_string(), content: system.to_string() });
    }
    messages.push(ChatMessage { role: "user".to_string(), content: prompt.to_string() });
    messages
}

// Request/Response types, shared with the Azure deployment API

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl ChatResponse {
    /// Trimmed content of the first choice.
    pub fn into_text(self, provider: &str) -> anyhow::Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LlmError::NoResponse { provider: provider.to_string() }.into())
    }
}
