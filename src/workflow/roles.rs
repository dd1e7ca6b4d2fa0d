//! Role registry.
//!
//! The fixed, ordered set of roles that take part in a workflow run: one
//! writer followed by the reviewers in the order they review the document.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WorkflowError;

/// Identity of a workflow role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleId {
    /// Drafts the document and applies every revision
    TechnicalWriter,
    /// Checks technical accuracy against the source content
    TechnicalReviewer,
    /// Checks structure, flow and organization
    InformationArchitect,
    /// Checks grammar, style and consistency
    TechnicalEditor,
}

impl RoleId {
    /// Human-readable role name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TechnicalWriter => "Technical Writer",
            Self::TechnicalReviewer => "Technical Reviewer",
            Self::InformationArchitect => "Information Architect",
            Self::TechnicalEditor => "Technical Editor",
        }
    }

    /// Stable kebab-case key used in config files and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::TechnicalWriter => "technical-writer",
            Self::TechnicalReviewer => "technical-reviewer",
            Self::InformationArchitect => "information-architect",
            Self::TechnicalEditor => "technical-editor",
        }
    }

    /// Look up a role by its slug or display name (case-insensitive).
    pub fn from_slug(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        [
            Self::TechnicalWriter,
            Self::TechnicalReviewer,
            Self::InformationArchitect,
            Self::TechnicalEditor,
        ]
        .into_iter()
        .find(|id| id.slug() == needle || id.name().to_lowercase() == needle)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a role writes or reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCategory {
    Writer,
    Reviewer,
}

/// What a reviewer looks at and which context its prompt receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewFocus {
    /// Area of expertise quoted in the review prompt
    pub specialization: &'static str,

    /// Whether the source content is attached for cross-referencing
    pub cross_reference_sources: bool,

    /// Whether global style guides and document-type guidance are included
    pub include_style_guidance: bool,
}

/// A participant in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Role identity
    pub id: RoleId,

    /// Writer or reviewer
    pub category: RoleCategory,

    /// Short description for listings
    pub description: &'static str,

    /// Default revision passes (reviewers only)
    pub default_max_loops: Option<u32>,

    /// Review focus (reviewers only)
    pub focus: Option<ReviewFocus>,
}

impl Role {
    /// Whether this role reviews the document.
    pub fn is_reviewer(&self) -> bool {
        self.category == RoleCategory::Reviewer
    }

    /// Whether this role writes the document.
    pub fn is_writer(&self) -> bool {
        self.category == RoleCategory::Writer
    }
}

const ACCURACY_SPECIALIZATION: &str = "technical accuracy and consistency with the provided source code. Verify claims, procedures, and factual statements against the source code. Treat source code as authoritative, identifying discrepancies between source code and the document as requiring revision.";

const ARCHITECTURE_SPECIALIZATION: &str = "information architecture (structure, flow, logical organization, clarity of headings, content grouping, navigation, and overall coherence for the intended audience)";

const EDITING_SPECIALIZATION: &str = "technical editing (grammar, spelling, punctuation, style, tone, voice, clarity, conciseness, terminology consistency, and adherence to common technical writing best practices)";

const STANDARD_ROLES: [Role; 4] = [
    Role {
        id: RoleId::TechnicalWriter,
        category: RoleCategory::Writer,
        description: "Generates and revises content based on inputs and feedback.",
        default_max_loops: None,
        focus: None,
    },
    Role {
        id: RoleId::TechnicalReviewer,
        category: RoleCategory::Reviewer,
        description: "Reviews for technical accuracy against source code.",
        default_max_loops: Some(2),
        focus: Some(ReviewFocus {
            specialization: ACCURACY_SPECIALIZATION,
            cross_reference_sources: true,
            include_style_guidance: false,
        }),
    },
    Role {
        id: RoleId::InformationArchitect,
        category: RoleCategory::Reviewer,
        description: "Reviews for structure, flow, clarity, and organization.",
        default_max_loops: Some(3),
        focus: Some(ReviewFocus {
            specialization: ARCHITECTURE_SPECIALIZATION,
            cross_reference_sources: false,
            include_style_guidance: true,
        }),
    },
    Role {
        id: RoleId::TechnicalEditor,
        category: RoleCategory::Reviewer,
        description: "Reviews for grammar, style, tone, and consistency.",
        default_max_loops: Some(3),
        focus: Some(ReviewFocus {
            specialization: EDITING_SPECIALIZATION,
            cross_reference_sources: false,
            include_style_guidance: true,
        }),
    },
];

/// Ordered list of roles for a workflow.
///
/// The first role is always the single writer; reviewers follow in review order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    roles: Vec<Role>,
}

impl RoleRegistry {
    /// The standard writer + three reviewer pipeline.
    pub fn standard() -> Self {
        Self { roles: STANDARD_ROLES.to_vec() }
    }

    /// Build a registry from a custom role list.
    ///
    /// The list must contain exactly one writer and it must come first.
    pub fn from_roles(roles: Vec<Role>) -> Result<Self, WorkflowError> {
        let writers = roles.iter().filter(|r| r.is_writer()).count();
        if writers != 1 {
            return Err(WorkflowError::InvalidRegistry(format!(
                "expected exactly one writer role, found {writers}"
            )));
        }
        if !roles.first().is_some_and(Role::is_writer) {
            return Err(WorkflowError::InvalidRegistry(
                "the writer role must come first".to_string(),
            ));
        }
        for (i, role) in roles.iter().enumerate() {
            if roles[..i].iter().any(|earlier| earlier.id == role.id) {
                return Err(WorkflowError::InvalidRegistry(format!(
                    "role '{}' appears more than once",
                    role.id
                )));
            }
        }
        if let Some(role) = roles.iter().find(|r| r.is_reviewer() && r.focus.is_none()) {
            return Err(WorkflowError::InvalidRegistry(format!(
                "reviewer '{}' has no review focus",
                role.id
            )));
        }

        Ok(Self { roles })
    }

    /// All roles in registry order.
    pub fn list_roles(&self) -> &[Role] {
        &self.roles
    }

    /// The writer role.
    pub fn writer(&self) -> &Role {
        // from_roles guarantees the writer is first
        &self.roles[0]
    }

    /// Reviewers in review order.
    pub fn reviewers(&self) -> Vec<&Role> {
        reviewers_of(&self.roles)
    }

    /// Look up a role by id.
    pub fn get(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Id of the four-role pipeline used when no workflow is selected.
pub const STANDARD_WORKFLOW: &str = "technical-documentation-standard";

/// A named pipeline: the standard roles to run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Role slugs in execution order; the writer must come first
    pub roles: Vec<String>,
}

impl WorkflowDefinition {
    /// Writer followed by all three reviewers.
    pub fn standard() -> Self {
        Self {
            id: STANDARD_WORKFLOW.to_string(),
            name: "Technical Documentation Standard".to_string(),
            description: "Writer and three reviewers".to_string(),
            roles: STANDARD_ROLES.iter().map(|r| r.id.slug().to_string()).collect(),
        }
    }

    /// Writer and technical editor only.
    pub fn quick_review() -> Self {
        Self {
            id: "quick-review".to_string(),
            name: "Quick Review".to_string(),
            description: "Writer and technical editor only".to_string(),
            roles: vec![
                RoleId::TechnicalWriter.slug().to_string(),
                RoleId::TechnicalEditor.slug().to_string(),
            ],
        }
    }

    /// The workflows that ship with docflow.
    pub fn builtin() -> Vec<Self> {
        vec![Self::standard(), Self::quick_review()]
    }

    /// Build and validate the registry for this pipeline.
    pub fn registry(&self) -> Result<RoleRegistry, WorkflowError> {
        let roles = self
            .roles
            .iter()
            .map(|slug| {
                let id = RoleId::from_slug(slug).ok_or_else(|| {
                    WorkflowError::InvalidRegistry(format!("unknown role '{}'", slug.trim()))
                })?;
                STANDARD_ROLES.iter().find(|r| r.id == id).cloned().ok_or_else(|| {
                    WorkflowError::InvalidRegistry(format!("role '{id}' is not available"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        RoleRegistry::from_roles(roles)
    }
}

/// Filter a role list down to reviewers, keeping their order.
pub fn reviewers_of(roles: &[Role]) -> Vec<&Role> {
    roles.iter().filter(|r| r.is_reviewer()).collect()
}
