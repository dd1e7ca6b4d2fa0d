//! Resolved inputs for a workflow run.

use std::collections::HashMap;

use super::roles::{Role, RoleId};

/// Default guidance for the technical reviewer.
pub const DEFAULT_TECHNICAL_REVIEWER_GUIDANCE: &str = "Verify all procedural steps, code examples, and technical claims against the provided source code. Treat source code as authoritative, identifying discrepancies between source code and the document as requiring revision.";

/// Default guidance for the information architect.
pub const DEFAULT_INFORMATION_ARCHITECT_GUIDANCE: &str = "Focus on a logical flow of information for effective and efficient transfer of information. If existing documentation was provided, ensure the document fits within its information architecture, avoids duplication, and references other documents with Markdown links (even placeholder) if they would aid in understanding or learning the content in the document being authored.";

/// Default guidance for the technical editor.
pub const DEFAULT_TECHNICAL_EDITOR_GUIDANCE: &str = "Adhere to standard technical writing best practices (e.g., active voice, consistent terminology, correct grammar and punctuation). Check for overall readability and conciseness. Headers of all levels should be sentence case, list markers should have only one space between the list marker (hyphen or N.) and the list item text, and there should be blank lines surrounding headers, lists, and fenced code blocks. Advise use of Mermaid diagrams where such content would add to understanding.";

/// Per-reviewer limits and guidance plus the global style guides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSettings {
    /// Max revision passes per reviewer, overriding the role default
    pub max_loops: HashMap<RoleId, u32>,

    /// Extra review guidance per reviewer
    pub reviewer_guidance: HashMap<RoleId, String>,

    /// Global writing style guide
    pub writing_style_guide: String,

    /// Global Markdown style guide
    pub markdown_style_guide: String,
}

impl AgentSettings {
    /// Settings with the shipped reviewer guidance and no overrides.
    pub fn with_default_guidance() -> Self {
        let reviewer_guidance = [
            (RoleId::TechnicalReviewer, DEFAULT_TECHNICAL_REVIEWER_GUIDANCE),
            (RoleId::InformationArchitect, DEFAULT_INFORMATION_ARCHITECT_GUIDANCE),
            (RoleId::TechnicalEditor, DEFAULT_TECHNICAL_EDITOR_GUIDANCE),
        ]
        .into_iter()
        .map(|(id, text)| (id, text.to_string()))
        .collect();

        Self { reviewer_guidance, ..Self::default() }
    }

    /// Override the loop bound of one reviewer.
    pub fn with_max_loops(mut self, role: RoleId, max_loops: u32) -> Self {
        self.max_loops.insert(role, max_loops);
        self
    }

    /// Set custom guidance for one reviewer.
    pub fn with_guidance(mut self, role: RoleId, guidance: impl Into<String>) -> Self {
        self.reviewer_guidance.insert(role, guidance.into());
        self
    }

    /// Effective loop bound for a role: the override, else the role default.
    ///
    /// Writers have no bound and return `None`.
    pub fn effective_max_loops(&self, role: &Role) -> Option<u32> {
        if !role.is_reviewer() {
            return None;
        }
        self.max_loops.get(&role.id).copied().or(role.default_max_loops).or(Some(0))
    }

    /// Custom guidance for a reviewer, if any non-blank text is configured.
    pub fn guidance_for(&self, role: RoleId) -> Option<&str> {
        self.reviewer_guidance.get(&role).map(String::as_str).filter(|g| !g.trim().is_empty())
    }
}

/// Snapshot of everything a run needs, captured when the run starts.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRunConfig {
    /// Selected document profile id
    pub profile_id: Option<String>,

    /// Primary source content (must not be blank)
    pub source_content: String,

    /// Optional authoritative supporting content
    pub supporting_content: String,

    /// Reviewer limits, guidance and style guides
    pub settings: AgentSettings,
}

impl WorkflowRunConfig {
    /// Create a config for a profile and source text.
    pub fn new(profile_id: impl Into<String>, source_content: impl Into<String>) -> Self {
        Self {
            profile_id: Some(profile_id.into()),
            source_content: source_content.into(),
            supporting_content: String::new(),
            settings: AgentSettings::default(),
        }
    }

    /// Attach supporting content.
    pub fn with_supporting(mut self, supporting: impl Into<String>) -> Self {
        self.supporting_content = supporting.into();
        self
    }

    /// Use the given agent settings.
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }
}
