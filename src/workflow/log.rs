//! Run telemetry.
//!
//! An append-only, timestamped log of everything a run did. Entries are
//! also forwarded to `tracing` so they show up in the process log.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::roles::RoleId;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Error,
    Success,
    /// Something a role did (drafting, reviewing, revising)
    AgentAction,
}

impl LogLevel {
    /// Upper-case label used in text exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
            Self::AgentAction => "AGENT",
        }
    }
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLogEntry {
    /// Unique id (UUID v4)
    pub id: String,

    /// When the entry was appended
    pub timestamp: DateTime<Local>,

    pub message: String,

    pub level: LogLevel,

    /// Role the entry is attributed to
    pub role: Option<RoleId>,
}

impl WorkflowLogEntry {
    /// Render as `[HH:MM:SS] [LEVEL] (Role) message`.
    pub fn to_line(&self) -> String {
        let time = self.timestamp.format("%H:%M:%S");
        match self.role {
            Some(role) => {
                format!("[{}] [{}] ({}) {}", time, self.level.label(), role, self.message)
            }
            None => format!("[{}] [{}] {}", time, self.level.label(), self.message),
        }
    }
}

/// Append-only log sink for one run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowLog {
    entries: Vec<WorkflowLogEntry>,
}

impl WorkflowLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it.
    pub fn append(
        &mut self,
        message: impl Into<String>,
        level: LogLevel,
        role: Option<RoleId>,
    ) -> &WorkflowLogEntry {
        let entry = WorkflowLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Local::now(),
            message: message.into(),
            level,
            role,
        };

        let role_name = role.map(|r| r.name()).unwrap_or("workflow");
        match level {
            LogLevel::Error => tracing::error!(role = role_name, "{}", entry.message),
            LogLevel::Success | LogLevel::Info => {
                tracing::info!(role = role_name, "{}", entry.message)
            }
            LogLevel::AgentAction => tracing::debug!(role = role_name, "{}", entry.message),
        }

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowLogEntry> {
        self.entries.iter()
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[WorkflowLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Only called on reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Export the whole log, one line per entry.
    pub fn to_text(&self) -> String {
        self.entries.iter().map(|e| e.to_line() + "\n").collect()
    }
}
