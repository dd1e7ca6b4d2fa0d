//! Google Gemini API integration.
//!
//! Uses the `generateContent` REST endpoint.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmError, LlmProvider, ProviderConfig, DEFAULT_GEMINI_MODEL, REQUEST_TIMEOUT};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: None,
        }
    }

    /// Create from resolved provider settings.
    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::NotConfigured("Gemini API key not configured".to_string())
        })?;

        let mut provider = Self::new(api_key);
        if let Some(model) = &config.model {
            provider.model = model.clone();
        }
        if let Some(temperature) = config.temperature {
            provider.temperature = temperature;
        }
        provider.max_tokens = config.max_tokens;

        Ok(provider)
    }

    fn build_request(&self, prompt: &str, system: Option<&str>) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: system.map(|s| Content { role: None, parts: vec![Part::text(s)] }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_k: 32,
                top_p: 0.9,
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_text(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<String> {
        let request = self.build_request(prompt, system);

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", BASE_URL, self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("Failed to generate text using Google Gemini API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status("Google Gemini", &self.model, status, &body).into());
        }

        let response: GenerateResponse =
            response.json().await.context("Invalid response from Google Gemini API")?;
        response.into_text()
    }

    fn name(&self) -> &str {
        "Google Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl Part {
    fn text(text: &str) -> Self {
        Self { text: text.to_string() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn into_text(self) -> anyhow::Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::NoResponse { provider: "Google Gemini".to_string() }.into());
        }
        Ok(text.to_string())
    }
}
