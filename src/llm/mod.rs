//! LLM provider layer.
//!
//! The workflow engine talks to a language model through [`LlmProvider`].
//! HTTP-backed providers for OpenAI, Azure OpenAI and Google Gemini are
//! available with the `providers` feature; [`ScriptedProvider`] replays
//! canned responses for tests and dry runs.

#[cfg(feature = "providers")]
mod azure;
#[cfg(feature = "providers")]
mod gemini;
#[cfg(feature = "providers")]
mod openai;
mod scripted;

use std::fmt;
#[cfg(feature = "providers")]
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "providers")]
pub use azure::AzureOpenAIProvider;
#[cfg(feature = "providers")]
pub use gemini::GeminiProvider;
#[cfg(feature = "providers")]
pub use openai::OpenAIProvider;
pub use scripted::ScriptedProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-04-17";

/// Default Azure OpenAI REST API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-01-preview";

/// Upper bound for a single provider request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a prompt, optionally steered by a system instruction.
    async fn generate_text(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<String>;

    /// Ask for a review decision and return the raw response text.
    async fn review(&self, prompt: &str) -> anyhow::Result<String> {
        self.generate_text(prompt, None).await
    }

    /// Provider display name.
    fn name(&self) -> &str;

    /// Model (or deployment) the provider talks to.
    fn model(&self) -> &str;
}

/// LLM error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("Invalid API Key. Please check your {provider} API key.")]
    InvalidApiKey { provider: String },

    #[error("API quota exceeded. Please check your {provider} quotas.")]
    QuotaExceeded { provider: String },

    #[error("Model or deployment '{model}' not found. Please check your {provider} settings.")]
    ModelNotFound { provider: String, model: String },

    #[error("Failed to generate text using {provider} API ({status}): {body}")]
    Api { provider: String, status: u16, body: String },

    #[error("No response content received from {provider}")]
    NoResponse { provider: String },

    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Map a failed HTTP status to the matching error.
    pub fn from_status(provider: &str, model: &str, status: u16, body: &str) -> Self {
        let provider = provider.to_string();
        match status {
            401 | 403 => Self::InvalidApiKey { provider },
            // Gemini reports bad keys as 400
            400 if body.contains("API key not valid") => Self::InvalidApiKey { provider },
            429 => Self::QuotaExceeded { provider },
            404 => Self::ModelNotFound { provider, model: model.to_string() },
            _ => Self::Api { provider, status, body: body.to_string() },
        }
    }
}

/// Supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "azure-openai")]
    AzureOpenAi,
    Gemini,
}

impl ProviderKind {
    /// Human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::AzureOpenAi => "Azure OpenAI",
            Self::Gemini => "Google Gemini",
        }
    }

    /// Identifier used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azure-openai",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure-openai" | "azure" => Ok(Self::AzureOpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(LlmError::NotConfigured(format!("unsupported provider: {other}"))),
        }
    }
}

/// Connection settings for one provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,

    /// Model name (OpenAI, Gemini)
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    pub base_url: Option<String>,

    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: Option<String>,

    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,

    /// Completion token limit, provider default when unset
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind, ..Self::default() }
    }

    /// Pick a provider from the environment.
    ///
    /// Checks OpenAI, then Azure OpenAI, then Gemini credentials and returns
    /// the first complete set.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(api_key) = var("OPENAI_API_KEY") {
            return Some(Self { api_key: Some(api_key), ..Self::new(ProviderKind::OpenAi) });
        }

        if let (Some(api_key), Some(endpoint), Some(deployment)) = (
            var("AZURE_OPENAI_API_KEY"),
            var("AZURE_OPENAI_ENDPOINT"),
            var("AZURE_OPENAI_DEPLOYMENT"),
        ) {
            return Some(Self {
                api_key: Some(api_key),
                azure_endpoint: Some(endpoint),
                azure_deployment: Some(deployment),
                azure_api_version: var("AZURE_OPENAI_API_VERSION"),
                ..Self::new(ProviderKind::AzureOpenAi)
            });
        }

        var("GEMINI_API_KEY")
            .map(|api_key| Self { api_key: Some(api_key), ..Self::new(ProviderKind::Gemini) })
    }

    /// Fill unset fields from the provider's environment variables.
    pub fn with_env_fallback(mut self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        match self.kind {
            ProviderKind::OpenAi => {
                self.api_key = self.api_key.or_else(|| var("OPENAI_API_KEY"));
            }
            ProviderKind::AzureOpenAi => {
                self.api_key = self.api_key.or_else(|| var("AZURE_OPENAI_API_KEY"));
                self.azure_endpoint = self.azure_endpoint.or_else(|| var("AZURE_OPENAI_ENDPOINT"));
                self.azure_deployment =
                    self.azure_deployment.or_else(|| var("AZURE_OPENAI_DEPLOYMENT"));
                self.azure_api_version =
                    self.azure_api_version.or_else(|| var("AZURE_OPENAI_API_VERSION"));
            }
            ProviderKind::Gemini => {
                self.api_key = self.api_key.or_else(|| var("GEMINI_API_KEY"));
            }
        }

        self
    }

    /// List every required field that is missing.
    pub fn validate(&self) -> Vec<String> {
        let missing =
            |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        let mut errors = Vec::new();

        if missing(&self.api_key) {
            errors.push(format!("{} API key is required", self.kind.display_name()));
        }
        if self.kind == ProviderKind::AzureOpenAi {
            if missing(&self.azure_endpoint) {
                errors.push("Azure OpenAI endpoint is required".to_string());
            }
            if missing(&self.azure_deployment) {
                errors.push("Azure OpenAI deployment name is required".to_string());
            }
        }

        errors
    }
}

/// Build the HTTP provider described by `config`.
#[cfg(feature = "providers")]
pub fn create_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(LlmError::NotConfigured(errors.join(", ")).into());
    }

    let provider: Arc<dyn LlmProvider> = match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAIProvider::from_config(config)?),
        ProviderKind::AzureOpenAi => Arc::new(AzureOpenAIProvider::from_config(config)?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::from_config(config)?),
    };

    tracing::debug!(provider = provider.name(), model = provider.model(), "created LLM provider");
    Ok(provider)
}
