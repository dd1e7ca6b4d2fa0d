//! Configuration management for docflow.
//!
//! Handles loading configuration from TOML files and resolving it into
//! provider and agent settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::llm::{ProviderConfig, ProviderKind};
use crate::workflow::{
    AgentSettings, DocumentProfile, ProfileCatalog, RoleId, RoleRegistry, WorkflowDefinition,
    STANDARD_WORKFLOW,
};

/// Name of the per-project config file.
pub const LOCAL_CONFIG_FILE: &str = ".docflow.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub llm: LlmConfig,

    /// Reviewer limits, guidance and style guides
    pub agents: AgentsConfig,

    /// Extra document-type profiles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<DocumentProfile>,

    /// Extra role pipelines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflows: Vec<WorkflowDefinition>,
}

/// LLM provider settings. Unset values fall back to environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider (openai, azure-openai, gemini)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_deployment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Reviewer agent settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Global writing style guide
    pub writing_style_guide: String,

    /// Global Markdown style guide
    pub markdown_style_guide: String,

    #[serde(rename = "technical-reviewer")]
    pub technical_reviewer: ReviewerConfig,

    #[serde(rename = "information-architect")]
    pub information_architect: ReviewerConfig,

    #[serde(rename = "technical-editor")]
    pub technical_editor: ReviewerConfig,
}

/// Settings for a single reviewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewerConfig {
    /// Max revision loops (role default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loops: Option<u32>,

    /// Custom review guidance (shipped guidance when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

impl AgentsConfig {
    /// Settings for one reviewer, `None` for the writer.
    pub fn reviewer(&self, role: RoleId) -> Option<&ReviewerConfig> {
        match role {
            RoleId::TechnicalWriter => None,
            RoleId::TechnicalReviewer => Some(&self.technical_reviewer),
            RoleId::InformationArchitect => Some(&self.information_architect),
            RoleId::TechnicalEditor => Some(&self.technical_editor),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.docflow.toml` in current directory
    /// 2. `~/.config/docflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(global_config) = Self::global_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load from an explicit path if given, otherwise the default locations.
    pub fn load_with(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// The file `load` would read, if any.
    pub fn resolve_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }
        Self::global_path().filter(|p| p.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docflow"))
    }

    /// Path of the global config file.
    pub fn global_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Resolve the provider settings.
    ///
    /// A provider named in `[llm]` is used with env fallbacks for missing
    /// fields. Otherwise the provider is detected from the environment and
    /// the `[llm]` model and sampling settings are applied on top.
    pub fn provider_config(&self) -> Option<ProviderConfig> {
        let llm = &self.llm;
        let base = match llm.provider {
            Some(kind) => ProviderConfig {
                api_key: llm.api_key.clone(),
                azure_endpoint: llm.azure_endpoint.clone(),
                azure_deployment: llm.azure_deployment.clone(),
                azure_api_version: llm.azure_api_version.clone(),
                ..ProviderConfig::new(kind)
            }
            .with_env_fallback(),
            None => ProviderConfig::from_env()?,
        };

        Some(ProviderConfig {
            model: llm.model.clone().or(base.model.clone()),
            base_url: llm.base_url.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            ..base
        })
    }

    /// Agent settings for a run: shipped guidance overlaid with this config.
    pub fn agent_settings(&self) -> AgentSettings {
        let mut settings = AgentSettings::with_default_guidance();
        settings.writing_style_guide = self.agents.writing_style_guide.clone();
        settings.markdown_style_guide = self.agents.markdown_style_guide.clone();

        let reviewers =
            [RoleId::TechnicalReviewer, RoleId::InformationArchitect, RoleId::TechnicalEditor];
        for role in reviewers {
            let Some(reviewer) = self.agents.reviewer(role) else {
                continue;
            };
            if let Some(max_loops) = reviewer.max_loops {
                settings.max_loops.insert(role, max_loops);
            }
            if let Some(guidance) = &reviewer.guidance {
                settings.reviewer_guidance.insert(role, guidance.clone());
            }
        }

        settings
    }

    /// Built-in profiles merged with the configured ones.
    pub fn profile_catalog(&self) -> ProfileCatalog {
        let mut catalog = ProfileCatalog::builtin();
        catalog.extend(self.profiles.iter().cloned());
        catalog
    }

    /// Built-in workflows followed by the configured ones. A configured
    /// workflow with a built-in id replaces it.
    pub fn workflow_catalog(&self) -> Vec<WorkflowDefinition> {
        let mut workflows = WorkflowDefinition::builtin();
        for workflow in &self.workflows {
            match workflows.iter_mut().find(|w| w.id == workflow.id) {
                Some(existing) => *existing = workflow.clone(),
                None => workflows.push(workflow.clone()),
            }
        }
        workflows
    }

    /// Role registry for a workflow id, the standard pipeline when `None`.
    pub fn role_registry(&self, workflow: Option<&str>) -> anyhow::Result<RoleRegistry> {
        let id = workflow.unwrap_or(STANDARD_WORKFLOW);
        let definition = self
            .workflow_catalog()
            .into_iter()
            .find(|w| w.id == id)
            .ok_or_else(|| anyhow::anyhow!("Unknown workflow '{id}'"))?;

        definition.registry().with_context(|| format!("Workflow '{id}' is invalid"))
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.llm.api_key.is_some() {
            config.llm.api_key = Some("********".to_string());
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            agents: AgentsConfig::default(),
            profiles: Vec::new(),
            workflows: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.provider.is_none());
        assert!(config.profiles.is_empty());
        assert_eq!(config.profile_catalog().len(), 2);
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [llm]
            provider = "azure-openai"
            azure_endpoint = "https://docs.openai.azure.com"
            azure_deployment = "gpt4o"

            [agents]
            writing_style_guide = "Use active voice."

            [agents.technical-editor]
            max_loops = 1
            guidance = "Prefer short sentences."
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.provider, Some(ProviderKind::AzureOpenAi));
        assert_eq!(config.agents.writing_style_guide, "Use active voice.");
        assert_eq!(config.agents.technical_editor.max_loops, Some(1));
        assert!(config.agents.technical_reviewer.max_loops.is_none());
    }

    #[test]
    fn test_agent_settings_overlay() {
        let toml_str = r#"
            [agents.technical-reviewer]
            max_loops = 0

            [agents.information-architect]
            guidance = ""
        "#;

        let settings = toml::from_str::<Config>(toml_str).unwrap().agent_settings();
        assert_eq!(settings.max_loops.get(&RoleId::TechnicalReviewer), Some(&0));
        assert!(!settings.max_loops.contains_key(&RoleId::TechnicalEditor));
        assert!(settings.guidance_for(RoleId::InformationArchitect).is_none());
        assert!(settings.guidance_for(RoleId::TechnicalEditor).is_some());
    }

    #[test]
    fn test_profiles_are_merged() {
        let toml_str = r##"
            [[profiles]]
            id = "reference"
            name = "API reference"
            template = "# API"

            [[profiles]]
            id = "profile_howto_default"
            name = "Recipe"
        "##;

        let catalog = toml::from_str::<Config>(toml_str).unwrap().profile_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("profile_howto_default").unwrap().name, "Recipe");
        assert_eq!(catalog.get("reference").unwrap().template, "# API");
    }

    #[test]
    fn test_workflow_registry_resolution() {
        let toml_str = r#"
            [[workflows]]
            id = "accuracy-only"
            name = "Accuracy only"
            roles = ["technical-writer", "technical-reviewer"]

            [[workflows]]
            id = "broken"
            name = "Broken"
            roles = ["technical-editor"]
        "#;
        let config = toml::from_str::<Config>(toml_str).unwrap();

        assert_eq!(config.workflow_catalog().len(), 4);
        assert_eq!(config.role_registry(None).unwrap(), RoleRegistry::standard());
        assert_eq!(config.role_registry(Some("quick-review")).unwrap().list_roles().len(), 2);

        let accuracy = config.role_registry(Some("accuracy-only")).unwrap();
        let reviewers: Vec<_> = accuracy.reviewers().iter().map(|r| r.id).collect();
        assert_eq!(reviewers, vec![RoleId::TechnicalReviewer]);

        let err = config.role_registry(Some("broken")).unwrap_err();
        assert!(format!("{err:#}").contains("exactly one writer"));
        let err = config.role_registry(Some("missing")).unwrap_err();
        assert!(err.to_string().contains("Unknown workflow"));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default();
        config.llm.provider = Some(ProviderKind::Gemini);
        config.agents.technical_editor.max_loops = Some(2);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("provider = \"gemini\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docflow.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4.1\"\n").unwrap();

        let config = Config::load_with(Some(&path)).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4.1"));

        std::fs::write(&path, "[llm\n").unwrap();
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_load_profile_with_markdown_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docflow.toml");
        std::fs::write(
            &path,
            r##"
[[profiles]]
id = "runbook"
name = "Runbook"
template = """
# Runbook

## Steps
"""
"##,
        )
        .unwrap();

        let catalog = Config::load_from_file(&path).unwrap().profile_catalog();
        let runbook = catalog.get("runbook").unwrap();
        assert_eq!(runbook.template, "# Runbook\n\n## Steps\n");
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_provider_config_passes_base_url() {
        let toml_str = r#"
[llm]
provider = "openai"
api_key = "sk-local"
base_url = "http://localhost:8080/v1"
"#;
        let provider = toml::from_str::<Config>(toml_str).unwrap().provider_config().unwrap();

        assert_eq!(provider.kind, ProviderKind::OpenAi);
        assert_eq!(provider.api_key.as_deref(), Some("sk-local"));
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_redacted_masks_api_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        assert_eq!(config.redacted().llm.api_key.as_deref(), Some("********"));
    }

    #[test]
    #[serial(llm_env)]
    fn test_provider_config_from_named_provider() {
        let original = std::env::var("GEMINI_API_KEY").ok();
        std::env::set_var("GEMINI_API_KEY", "g-key");

        let mut config = Config::default();
        config.llm.provider = Some(ProviderKind::Gemini);
        config.llm.model = Some("gemini-2.0-flash".to_string());
        let provider = config.provider_config().unwrap();

        match original {
            Some(val) => std::env::set_var("GEMINI_API_KEY", val),
            None => std::env::remove_var("GEMINI_API_KEY"),
        }

        assert_eq!(provider.kind, ProviderKind::Gemini);
        assert_eq!(provider.api_key.as_deref(), Some("g-key"));
        assert_eq!(provider.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(provider.base_url.is_none());
    }
}
