//! Azure OpenAI API integration.
//!
//! Implements the LlmProvider trait for Azure OpenAI deployments.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use super::openai::{chat_messages, ChatRequest, ChatResponse};
use super::{LlmError, LlmProvider, ProviderConfig, DEFAULT_AZURE_API_VERSION, REQUEST_TIMEOUT};

/// Azure OpenAI API provider.
pub struct AzureOpenAIProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    temperature: f32,
    max_tokens: u32,
}

impl AzureOpenAIProvider {
    /// Create from explicit config values.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            temperature: 1.0,
            max_tokens: 15_000,
        }
    }

    /// Create from resolved provider settings.
    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let required = |value: &Option<String>, what: &str| {
            value
                .clone()
                .ok_or_else(|| LlmError::NotConfigured(format!("Azure OpenAI {what} is required")))
        };

        let mut provider = Self::new(
            required(&config.azure_endpoint, "endpoint")?,
            required(&config.api_key, "API key")?,
            required(&config.azure_deployment, "deployment name")?,
        );
        if let Some(version) = &config.azure_api_version {
            provider = provider.with_api_version(version.clone());
        }
        if let Some(temperature) = config.temperature {
            provider.temperature = temperature;
        }
        if let Some(max_tokens) = config.max_tokens {
            provider.max_tokens = max_tokens;
        }

        Ok(provider)
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    // {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}
    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAIProvider {
    async fn generate_text(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: None,
            messages: chat_messages(prompt, system),
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("Failed to generate text using Azure OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let err = LlmError::from_status("Azure OpenAI", &self.deployment, status, &body);
            return Err(err.into());
        }

        let response: ChatResponse =
            response.json().await.context("Invalid response from Azure OpenAI API")?;
        response.into_text("Azure OpenAI")
    }

    fn name(&self) -> &str {
        "Azure OpenAI"
    }

    fn model(&self) -> &str {
        &self.deployment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderKind;

    #[test]
    fn test_completions_url() {
        let config = ProviderConfig {
            api_key: Some("key".into()),
            azure_endpoint: Some("https://docs.openai.azure.com/".into()),
            azure_deployment: Some("gpt4o-docs".into()),
            azure_api_version: Some("2024-06-01".into()),
            ..ProviderConfig::new(ProviderKind::AzureOpenAi)
        };
        let provider = AzureOpenAIProvider::from_config(&config).unwrap();

        assert_eq!(
            provider.completions_url(),
            "https://docs.openai.azure.com/openai/deployments/gpt4o-docs/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = ProviderConfig {
            api_key: Some("key".into()),
            azure_deployment: Some("dep".into()),
            ..ProviderConfig::new(ProviderKind::AzureOpenAi)
        };

        let err = AzureOpenAIProvider::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_from_config_uses_default_version() {
        let config = ProviderConfig {
            api_key: Some("key".into()),
            azure_endpoint: Some("https://x.openai.azure.com".into()),
            azure_deployment: Some("dep".into()),
            ..ProviderConfig::new(ProviderKind::AzureOpenAi)
        };

        let provider = AzureOpenAIProvider::from_config(&config).unwrap();
        assert_eq!(provider.api_version, DEFAULT_AZURE_API_VERSION);
        assert_eq!(provider.model(), "dep");
    }

    #[tokio::test]
    async fn test_transport_error_names_provider() {
        let provider = AzureOpenAIProvider::new("http://127.0.0.1:9", "key", "dep");

        let err = provider.generate_text("Review", None).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to generate text using Azure OpenAI API"));
    }
}
