//! Workflow engine.
//!
//! Drives one run: the writer drafts, every reviewer reviews in registry
//! order, revision requests go back to the writer until the reviewer
//! approves, fails, or runs out of loops.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use super::decision::{self, ReviewDecision, EXCERPT_CHARS};
use super::log::{LogLevel, WorkflowLog, WorkflowLogEntry};
use super::profiles::{DocumentProfile, ProfileCatalog};
use super::prompts::{self, SYSTEM_INSTRUCTION};
use super::results::{RoleRuntimeState, RoleStatus, RunResults};
use super::roles::{Role, RoleId, RoleRegistry};
use super::settings::{AgentSettings, WorkflowRunConfig};
use super::WorkflowError;
use crate::llm::LlmProvider;

/// Overall state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Progress notification for observers of a run.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A log entry was appended
    Log(WorkflowLogEntry),

    /// A role changed status, feedback or loop count
    RoleUpdated(RoleRuntimeState),

    /// The writer produced a new version of the document
    DocumentUpdated(String),
}

/// Runs the writer/reviewer pipeline against an LLM provider.
pub struct WorkflowEngine {
    provider: Arc<dyn LlmProvider>,
    registry: RoleRegistry,
    profiles: ProfileCatalog,
    log: WorkflowLog,
    results: RunResults,
    document: Option<String>,
    error_message: Option<String>,
    status: RunStatus,
    events: Option<UnboundedSender<WorkflowEvent>>,
}

impl WorkflowEngine {
    /// Create an engine with the standard roles and the built-in profiles.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let registry = RoleRegistry::standard();
        let results = RunResults::new(&registry, &AgentSettings::default());

        Self {
            provider,
            registry,
            profiles: ProfileCatalog::builtin(),
            log: WorkflowLog::new(),
            results,
            document: None,
            error_message: None,
            status: RunStatus::Idle,
            events: None,
        }
    }

    /// Use a different profile catalog.
    pub fn with_profiles(mut self, profiles: ProfileCatalog) -> Self {
        self.profiles = profiles;
        self
    }

    /// Use a custom role registry.
    pub fn with_registry(mut self, registry: RoleRegistry) -> Self {
        self.results = RunResults::new(&registry, &AgentSettings::default());
        self.registry = registry;
        self
    }

    /// Send progress events to the given channel.
    pub fn with_events(mut self, events: UnboundedSender<WorkflowEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn log(&self) -> &WorkflowLog {
        &self.log
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    /// Latest version of the document, including mid-run drafts.
    pub fn current_document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Message of the last precondition or fatal error.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Clear logs, results, the document and the error, returning every role
    /// to `Pending`.
    pub fn reset(&mut self) {
        self.reset_with(&AgentSettings::default());
        self.status = RunStatus::Idle;
    }

    fn reset_with(&mut self, settings: &AgentSettings) {
        self.log.clear();
        self.results.clear(&self.registry, settings);
        self.document = None;
        self.error_message = None;
    }

    /// Run the workflow and return the final document.
    ///
    /// Reviewer protocol violations do not fail the run; the reviewer is
    /// marked failed and the next one takes over. Any provider error aborts
    /// the run.
    pub async fn run(&mut self, config: WorkflowRunConfig) -> Result<String, WorkflowError> {
        let profile = match self.resolve_profile(&config) {
            Ok(profile) => profile,
            Err(e) => {
                self.record(format!("Error: {}.", e), LogLevel::Error, None);
                self.error_message = Some(e.to_string());
                self.status = RunStatus::Failed;
                return Err(e);
            }
        };

        self.reset_with(&config.settings);
        self.status = RunStatus::Running;
        self.record(
            format!(
                "Workflow started for profile: \"{}\" | Provider: {} | Model: {}",
                profile.name,
                self.provider.name(),
                self.provider.model()
            ),
            LogLevel::Info,
            None,
        );

        match self.execute(&profile, &config).await {
            Ok(document) => {
                self.results.set_final_document(document.clone());
                let writer = self.registry.writer().id;
                if self.results.state(writer).is_some_and(|s| {
                    !matches!(s.status, RoleStatus::Failed | RoleStatus::SkippedMaxLoops)
                }) {
                    self.update_role(writer, RoleStatus::Completed, None);
                }
                self.record(
                    "Workflow completed! Document is ready for download.",
                    LogLevel::Success,
                    None,
                );
                self.status = RunStatus::Succeeded;
                Ok(document)
            }
            Err(e) => {
                let message = format!("{e:#}");
                self.fail_active_roles();
                self.record(format!("Workflow failed: {}", message), LogLevel::Error, None);
                self.error_message = Some(message.clone());
                self.status = RunStatus::Failed;
                Err(WorkflowError::Provider(message))
            }
        }
    }

    fn resolve_profile(
        &self,
        config: &WorkflowRunConfig,
    ) -> Result<DocumentProfile, WorkflowError> {
        let id = config.profile_id.as_deref().ok_or(WorkflowError::NoProfileSelected)?;
        let profile = self
            .profiles
            .get(id)
            .ok_or_else(|| WorkflowError::ProfileNotFound(id.to_string()))?;

        if config.source_content.trim().is_empty() {
            return Err(WorkflowError::EmptySource);
        }

        Ok(profile.clone())
    }

    async fn execute(
        &mut self,
        profile: &DocumentProfile,
        config: &WorkflowRunConfig,
    ) -> anyhow::Result<String> {
        let settings = &config.settings;
        let writer = self.registry.writer().id;

        self.update_role(writer, RoleStatus::Working, None);
        self.record("Generating initial draft...", LogLevel::AgentAction, Some(writer));
        let prompt = prompts::initial_draft_prompt(
            profile,
            &config.source_content,
            &config.supporting_content,
            settings,
        );
        let mut document = self.generate(&prompt).await?;
        self.update_role(writer, RoleStatus::Completed, None);
        self.record("Initial draft generated.", LogLevel::Success, Some(writer));

        let reviewers: Vec<Role> = self.registry.reviewers().into_iter().cloned().collect();
        for reviewer in &reviewers {
            document = self.review_cycle(reviewer, profile, config, document).await?;
        }

        Ok(document)
    }

    /// Review loop for one reviewer. Returns the document as it stands when
    /// the reviewer is done with it.
    async fn review_cycle(
        &mut self,
        reviewer: &Role,
        profile: &DocumentProfile,
        config: &WorkflowRunConfig,
        mut document: String,
    ) -> anyhow::Result<String> {
        let settings = &config.settings;
        let writer = self.registry.writer().id;
        let max_loops = settings.effective_max_loops(reviewer).unwrap_or(0);
        let mut loops = 0;

        self.update_role(reviewer.id, RoleStatus::Reviewing, None);
        self.set_loops(reviewer.id, loops);

        loop {
            if loops >= max_loops {
                self.record(
                    format!(
                        "Max revision loops ({}) reached for {}. Proceeding to next role.",
                        max_loops, reviewer.id
                    ),
                    LogLevel::Info,
                    Some(reviewer.id),
                );
                self.update_role(reviewer.id, RoleStatus::SkippedMaxLoops, None);
                return Ok(document);
            }

            self.record(
                format!("Reviewing document (Loop {}/{})...", loops + 1, max_loops),
                LogLevel::AgentAction,
                Some(reviewer.id),
            );

            let Some(prompt) = prompts::review_prompt(
                reviewer,
                profile,
                &document,
                &config.source_content,
                &config.supporting_content,
                settings,
            ) else {
                // registry validation guarantees every reviewer has a focus
                self.update_role(reviewer.id, RoleStatus::Failed, Some("no review focus".into()));
                return Ok(document);
            };

            tracing::debug!(role = reviewer.id.name(), loops, "requesting review");
            let raw = self.provider.review(&prompt).await?;

            match decision::parse(&raw) {
                ReviewDecision::Continue => {
                    self.record("Document approved.", LogLevel::Success, Some(reviewer.id));
                    self.update_role(reviewer.id, RoleStatus::Approved, None);
                    return Ok(document);
                }
                ReviewDecision::Revise { feedback } => {
                    self.record(
                        format!(
                            "Revisions requested: \"{}...\"",
                            decision::excerpt(&feedback, EXCERPT_CHARS)
                        ),
                        LogLevel::AgentAction,
                        Some(reviewer.id),
                    );
                    self.update_role(reviewer.id, RoleStatus::Waiting, Some(feedback.clone()));
                    self.results.push_feedback(reviewer.id, feedback.clone());

                    self.update_role(writer, RoleStatus::Working, None);
                    self.record("Applying revisions...", LogLevel::AgentAction, Some(writer));
                    let prompt = prompts::revision_prompt(profile, &document, &feedback, settings);
                    document = self.generate(&prompt).await?;
                    self.update_role(writer, RoleStatus::Completed, None);
                    self.record(
                        "Revisions applied by Technical Writer.",
                        LogLevel::Success,
                        Some(writer),
                    );

                    loops += 1;
                    self.set_loops(reviewer.id, loops);
                    self.update_role(reviewer.id, RoleStatus::Reviewing, None);
                }
                ReviewDecision::Error { message } => {
                    self.record(
                        format!(
                            "Error during review by {}: {}. Proceeding with current document.",
                            reviewer.id, message
                        ),
                        LogLevel::Error,
                        Some(reviewer.id),
                    );
                    self.update_role(reviewer.id, RoleStatus::Failed, Some(message));
                    return Ok(document);
                }
            }
        }
    }

    /// Call the writer model and store the result as the current document.
    async fn generate(&mut self, prompt: &str) -> anyhow::Result<String> {
        tracing::debug!(
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            "generating text"
        );
        let document = self.provider.generate_text(prompt, Some(SYSTEM_INSTRUCTION)).await?;

        self.document = Some(document.clone());
        self.emit(WorkflowEvent::DocumentUpdated(document.clone()));
        Ok(document)
    }

    fn fail_active_roles(&mut self) {
        let active: Vec<RoleId> = self
            .results
            .runtime_states()
            .iter()
            .filter(|s| s.status.is_active())
            .map(|s| s.role)
            .collect();

        for role in active {
            self.update_role(role, RoleStatus::Failed, None);
        }
    }

    fn record(&mut self, message: impl Into<String>, level: LogLevel, role: Option<RoleId>) {
        let entry = self.log.append(message, level, role).clone();
        self.emit(WorkflowEvent::Log(entry));
    }

    /// Set a role's status. `feedback` replaces the stored feedback only
    /// when given.
    fn update_role(&mut self, role: RoleId, status: RoleStatus, feedback: Option<String>) {
        let Some(state) = self.results.state_mut(role) else {
            return;
        };
        state.status = status;
        if feedback.is_some() {
            state.feedback = feedback;
        }

        let snapshot = state.clone();
        self.emit(WorkflowEvent::RoleUpdated(snapshot));
    }

    fn set_loops(&mut self, role: RoleId, loops: u32) {
        if let Some(state) = self.results.state_mut(role) {
            state.loops = loops;
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(tx) = &self.events {
            // a dropped receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }
}
