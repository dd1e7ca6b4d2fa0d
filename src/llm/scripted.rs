//! Scripted provider.
//!
//! Replays queued responses instead of calling a model. Used by tests and by
//! the CLI's `--dry-run` mode.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::LlmProvider;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn into_result(self) -> anyhow::Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Fail(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Provider that answers from pre-recorded queues.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    generations: Mutex<VecDeque<Reply>>,
    reviews: Mutex<VecDeque<Reply>>,
    generation_prompts: Mutex<Vec<String>>,
    review_prompts: Mutex<Vec<String>>,
    offline: bool,
}

impl ScriptedProvider {
    /// A provider with empty queues. Calls past the end of a queue fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that never runs dry: generations return a placeholder
    /// draft and every review approves.
    pub fn dry_run() -> Self {
        Self { offline: true, ..Self::default() }
    }

    /// Queue writer responses.
    pub fn with_generations<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generations.lock().extend(responses.into_iter().map(|r| Reply::Text(r.into())));
        self
    }

    /// Queue raw reviewer responses.
    pub fn with_reviews<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reviews.lock().extend(responses.into_iter().map(|r| Reply::Text(r.into())));
        self
    }

    /// Queue a failing writer call.
    pub fn with_generation_error(self, message: impl Into<String>) -> Self {
        self.generations.lock().push_back(Reply::Fail(message.into()));
        self
    }

    /// Queue a failing review call.
    pub fn with_review_error(self, message: impl Into<String>) -> Self {
        self.reviews.lock().push_back(Reply::Fail(message.into()));
        self
    }

    /// Number of `generate_text` calls made so far.
    pub fn generation_calls(&self) -> usize {
        self.generation_prompts.lock().len()
    }

    /// Number of `review` calls made so far.
    pub fn review_calls(&self) -> usize {
        self.review_prompts.lock().len()
    }

    /// Prompts passed to `generate_text`, in call order.
    pub fn generation_prompts(&self) -> Vec<String> {
        self.generation_prompts.lock().clone()
    }

    /// Prompts passed to `review`, in call order.
    pub fn review_prompts(&self) -> Vec<String> {
        self.review_prompts.lock().clone()
    }

    fn placeholder_draft(prompt: &str) -> String {
        format!(
            "# Dry run draft\n\nThis document was produced without calling a model.\n\nThe writer prompt was {} characters long.\n",
            prompt.chars().count()
        )
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate_text(&self, prompt: &str, _system: Option<&str>) -> anyhow::Result<String> {
        self.generation_prompts.lock().push(prompt.to_string());

        let next = self.generations.lock().pop_front();
        match next {
            Some(reply) => reply.into_result(),
            None if self.offline => Ok(Self::placeholder_draft(prompt)),
            None => anyhow::bail!("scripted provider has no generation response left"),
        }
    }

    async fn review(&self, prompt: &str) -> anyhow::Result<String> {
        self.review_prompts.lock().push(prompt.to_string());

        let next = self.reviews.lock().pop_front();
        match next {
            Some(reply) => reply.into_result(),
            None if self.offline => Ok("CONTINUE".to_string()),
            None => anyhow::bail!("scripted provider has no review response left"),
        }
    }

    fn name(&self) -> &str {
        if self.offline {
            "Dry run"
        } else {
            "Scripted"
        }
    }

    fn model(&self) -> &str {
        "none"
    }
}
