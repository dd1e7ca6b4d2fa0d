//! Multi-role document revision workflow.
//!
//! A writer drafts a document from the source content, then each reviewer
//! in turn either approves it or asks for a revision, up to a per-reviewer
//! loop bound.
//!
//! ## Components
//!
//! - [`RoleRegistry`] - the ordered writer + reviewer roles
//! - [`decision::parse`] - reviewer response parsing
//! - [`WorkflowEngine`] - the run state machine
//! - [`WorkflowLog`] - run telemetry
//! - [`RunResults`] - final document, feedback log and role states

pub mod decision;
mod engine;
mod log;
pub mod profiles;
pub mod prompts;
mod results;
pub mod roles;
mod settings;

pub use decision::ReviewDecision;
pub use engine::{RunStatus, WorkflowEngine, WorkflowEvent};
pub use log::{LogLevel, WorkflowLog, WorkflowLogEntry};
pub use profiles::{DocumentProfile, ProfileCatalog};
pub use results::{
    document_filename, format_feedback_log, FeedbackLogEntry, RoleRuntimeState, RoleStatus,
    RunResults, EMPTY_FEEDBACK_LOG,
};
pub use roles::{
    reviewers_of, ReviewFocus, Role, RoleCategory, RoleId, RoleRegistry, WorkflowDefinition,
    STANDARD_WORKFLOW,
};
pub use settings::{
    AgentSettings, WorkflowRunConfig, DEFAULT_INFORMATION_ARCHITECT_GUIDANCE,
    DEFAULT_TECHNICAL_EDITOR_GUIDANCE, DEFAULT_TECHNICAL_REVIEWER_GUIDANCE,
};

/// Workflow error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("No document type profile selected")]
    NoProfileSelected,

    #[error("Selected profile with ID {0} not found")]
    ProfileNotFound(String),

    #[error("Source content is empty")]
    EmptySource,

    #[error("{0}")]
    Provider(String),

    #[error("Invalid role registry: {0}")]
    InvalidRegistry(String),
}
