//! Result aggregation and run artifacts.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::roles::{RoleId, RoleRegistry};
use super::settings::AgentSettings;

/// Text written in place of the feedback log when no reviewer asked for changes.
pub const EMPTY_FEEDBACK_LOG: &str = "No review feedback was provided during this workflow run.";

/// Per-role status during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    Pending,
    Working,
    Reviewing,
    /// Reviewer is waiting for the writer to apply its feedback
    Waiting,
    Approved,
    SkippedMaxLoops,
    Failed,
    Completed,
}

impl RoleStatus {
    /// Whether the role is still taking part in the run.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Working | Self::Reviewing | Self::Waiting)
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Working => "Working...",
            Self::Reviewing => "Reviewing...",
            Self::Waiting => "Waiting for revision",
            Self::Approved => "Approved",
            Self::SkippedMaxLoops => "Skipped (max loops)",
            Self::Failed => "Failed",
            Self::Completed => "Completed",
        };
        f.write_str(label)
    }
}

/// Live state of one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRuntimeState {
    pub role: RoleId,
    pub status: RoleStatus,

    /// Last feedback given, or the failure message
    pub feedback: Option<String>,

    /// Revision passes consumed so far
    pub loops: u32,

    /// Effective loop bound (reviewers only)
    pub max_loops: Option<u32>,
}

/// One reviewer's revision request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLogEntry {
    pub role: RoleId,
    pub feedback: String,
    pub timestamp: DateTime<Local>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    final_document: Option<String>,
    feedback_log: Vec<FeedbackLogEntry>,
    runtime_states: Vec<RoleRuntimeState>,
}

impl RunResults {
    /// Fresh results with one `Pending` state per role.
    pub fn new(registry: &RoleRegistry, settings: &AgentSettings) -> Self {
        let mut results = Self::default();
        results.clear(registry, settings);
        results
    }

    /// The finished document, set only when the run succeeded.
    pub fn final_document(&self) -> Option<&str> {
        self.final_document.as_deref()
    }

    /// Revision requests in the order they were made.
    pub fn feedback_log(&self) -> &[FeedbackLogEntry] {
        &self.feedback_log
    }

    /// Role states in registry order.
    pub fn runtime_states(&self) -> &[RoleRuntimeState] {
        &self.runtime_states
    }

    /// State of a single role.
    pub fn state(&self, role: RoleId) -> Option<&RoleRuntimeState> {
        self.runtime_states.iter().find(|s| s.role == role)
    }

    /// Reset everything for the given registry and settings.
    pub fn clear(&mut self, registry: &RoleRegistry, settings: &AgentSettings) {
        self.final_document = None;
        self.feedback_log.clear();
        self.runtime_states = registry
            .list_roles()
            .iter()
            .map(|role| RoleRuntimeState {
                role: role.id,
                status: RoleStatus::Pending,
                feedback: None,
                loops: 0,
                max_loops: settings.effective_max_loops(role),
            })
            .collect();
    }

    pub(crate) fn state_mut(&mut self, role: RoleId) -> Option<&mut RoleRuntimeState> {
        self.runtime_states.iter_mut().find(|s| s.role == role)
    }

    pub(crate) fn push_feedback(&mut self, role: RoleId, feedback: impl Into<String>) {
        self.feedback_log.push(FeedbackLogEntry {
            role,
            feedback: feedback.into(),
            timestamp: Local::now(),
        });
    }

    pub(crate) fn set_final_document(&mut self, document: String) {
        self.final_document = Some(document);
    }
}

/// Render the feedback log as a plain-text artifact.
pub fn format_feedback_log(entries: &[FeedbackLogEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_FEEDBACK_LOG.to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "Role: {}\nTimestamp: {}\nFeedback:\n{}\n\n---\n",
                entry.role,
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.feedback
            )
        })
        .collect()
}

/// File name for a finished document: `<Profile_Name>_<YYYY-MM-DD>.md`.
pub fn document_filename(profile_name: &str, date: NaiveDate) -> String {
    let stem = profile_name.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "document".to_string() } else { stem };
    format!("{}_{}.md", stem, date.format("%Y-%m-%d"))
}
