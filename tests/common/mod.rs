//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use docflow::workflow::{AgentSettings, RoleId, RoleStatus, WorkflowEngine, WorkflowRunConfig};
use docflow::ScriptedProvider;

/// Id of the built-in how-to profile.
pub const HOWTO: &str = "profile_howto_default";

/// Source text used by the end-to-end scenarios.
pub const SOURCE: &str = "Deploy the service.";

/// Engine wired to a shared scripted provider.
pub fn engine_with(provider: &Arc<ScriptedProvider>) -> WorkflowEngine {
    WorkflowEngine::new(provider.clone())
}

/// Run config for the how-to profile with the given settings.
pub fn run_config(settings: AgentSettings) -> WorkflowRunConfig {
    WorkflowRunConfig::new(HOWTO, SOURCE).with_settings(settings)
}

/// Status of one role after a run.
pub fn status_of(engine: &WorkflowEngine, role: RoleId) -> RoleStatus {
    engine.results().state(role).map(|s| s.status).unwrap_or(RoleStatus::Pending)
}

/// Every reviewer, in review order.
pub const REVIEWERS: [RoleId; 3] =
    [RoleId::TechnicalReviewer, RoleId::InformationArchitect, RoleId::TechnicalEditor];
