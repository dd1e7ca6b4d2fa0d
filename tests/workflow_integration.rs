//! Workflow Integration Tests
//!
//! Drives the engine end-to-end against a scripted provider.

mod common;

use std::sync::Arc;

use common::{engine_with, run_config, status_of, HOWTO, REVIEWERS, SOURCE};
use docflow::workflow::{
    format_feedback_log, AgentSettings, LogLevel, RoleId, RoleStatus, RunStatus,
    WorkflowRunConfig, EMPTY_FEEDBACK_LOG,
};
use docflow::{ScriptedProvider, WorkflowError};

/// Settings that skip every reviewer except `role`.
fn only(role: RoleId, max_loops: u32) -> AgentSettings {
    REVIEWERS.iter().fold(AgentSettings::with_default_guidance(), |settings, reviewer| {
        settings.with_max_loops(*reviewer, if *reviewer == role { max_loops } else { 0 })
    })
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_all_reviewers_approve_first_draft() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["# Deploy the service"])
                .with_reviews(["CONTINUE", "CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);

        let config = run_config(AgentSettings::with_default_guidance());
        let document = engine.run(config).await.unwrap();

        assert_eq!(document, "# Deploy the service");
        assert_eq!(engine.results().final_document(), Some("# Deploy the service"));
        assert!(engine.results().feedback_log().is_empty());
        for reviewer in REVIEWERS {
            assert_eq!(status_of(&engine, reviewer), RoleStatus::Approved);
        }
        assert_eq!(status_of(&engine, RoleId::TechnicalWriter), RoleStatus::Completed);
        assert_eq!(format_feedback_log(engine.results().feedback_log()), EMPTY_FEEDBACK_LOG);
    }

    #[tokio::test]
    async fn test_one_revision_then_approval() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft v1", "draft v2"])
                .with_reviews(["REVISE: fix step 3", "CONTINUE", "CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);
        let settings =
            AgentSettings::with_default_guidance().with_max_loops(RoleId::TechnicalReviewer, 2);

        let document = engine.run(run_config(settings)).await.unwrap();

        assert_eq!(document, "draft v2");
        assert_eq!(provider.generation_calls(), 2);
        assert_eq!(status_of(&engine, RoleId::TechnicalReviewer), RoleStatus::Approved);

        let feedback = engine.results().feedback_log();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].role, RoleId::TechnicalReviewer);
        assert_eq!(feedback[0].feedback, "fix step 3");

        let exported = format_feedback_log(feedback);
        assert!(exported.starts_with("Role: Technical Reviewer\n"));
        assert!(exported.contains("Feedback:\nfix step 3\n\n---\n"));
    }

    #[tokio::test]
    async fn test_zero_loop_reviewer_is_skipped_without_calls() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_reviews(["CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);
        let settings =
            AgentSettings::with_default_guidance().with_max_loops(RoleId::InformationArchitect, 0);

        engine.run(run_config(settings)).await.unwrap();

        assert_eq!(status_of(&engine, RoleId::InformationArchitect), RoleStatus::SkippedMaxLoops);
        assert_eq!(provider.review_calls(), 2);
        assert!(provider
            .review_prompts()
            .iter()
            .all(|prompt| !prompt.contains("You are an expert Information Architect")));
    }

    #[tokio::test]
    async fn test_initial_generation_failure_aborts_run() {
        let provider = Arc::new(ScriptedProvider::new().with_generation_error("quota exceeded"));
        let mut engine = engine_with(&provider);

        let err = engine.run(run_config(AgentSettings::default())).await.unwrap_err();

        assert_eq!(err, WorkflowError::Provider("quota exceeded".to_string()));
        assert!(engine.results().runtime_states().iter().all(|s| s.status == RoleStatus::Failed));
        assert!(engine.results().final_document().is_none());
        assert_eq!(engine.error_message(), Some("quota exceeded"));
        assert_eq!(engine.status(), RunStatus::Failed);

        let errors: Vec<_> =
            engine.log().iter().filter(|e| e.level == LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("quota exceeded"));
        assert_eq!(provider.review_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_review_degrades_gracefully() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft v1", "draft v2"])
                .with_reviews(["Looks fine", "REVISE: add a diagram", "CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);

        let config = run_config(AgentSettings::with_default_guidance());
        let document = engine.run(config).await.unwrap();

        let reviewer = engine.results().state(RoleId::TechnicalReviewer).unwrap();
        assert_eq!(reviewer.status, RoleStatus::Failed);
        assert!(reviewer.feedback.as_deref().unwrap().contains("unexpected response format"));
        assert!(reviewer.feedback.as_deref().unwrap().contains("Looks fine"));

        assert_eq!(status_of(&engine, RoleId::InformationArchitect), RoleStatus::Approved);
        assert_eq!(status_of(&engine, RoleId::TechnicalEditor), RoleStatus::Approved);
        assert_eq!(document, "draft v2");
        assert_eq!(engine.results().final_document(), Some("draft v2"));
        assert!(engine.error_message().is_none());
    }
}

// ============================================================================
// Loop Bounds
// ============================================================================

mod loop_bounds {
    use super::*;

    #[tokio::test]
    async fn test_never_approving_reviewer_uses_every_loop() {
        for max_loops in 0..=3u32 {
            let provider = Arc::new(
                ScriptedProvider::new()
                    .with_generations((0..=max_loops).map(|i| format!("draft {i}")))
                    .with_reviews((0..max_loops).map(|i| format!("REVISE: change {i}"))),
            );
            let mut engine = engine_with(&provider);

            let document =
                engine.run(run_config(only(RoleId::TechnicalEditor, max_loops))).await.unwrap();

            let editor = engine.results().state(RoleId::TechnicalEditor).unwrap();
            assert_eq!(editor.status, RoleStatus::SkippedMaxLoops);
            assert_eq!(editor.loops, max_loops);
            assert_eq!(provider.generation_calls(), 1 + max_loops as usize);
            assert_eq!(provider.review_calls(), max_loops as usize);
            assert_eq!(document, format!("draft {max_loops}"));
            assert_eq!(engine.results().feedback_log().len(), max_loops as usize);
        }
    }

    #[tokio::test]
    async fn test_approval_on_kth_attempt() {
        let max_loops = 3;
        for k in 1..=max_loops {
            let reviews: Vec<String> = (1..k)
                .map(|i| format!("REVISE: pass {i}"))
                .chain(std::iter::once("CONTINUE".to_string()))
                .collect();
            let provider = Arc::new(
                ScriptedProvider::new()
                    .with_generations((0..k).map(|i| format!("draft {i}")))
                    .with_reviews(reviews),
            );
            let mut engine = engine_with(&provider);

            engine.run(run_config(only(RoleId::InformationArchitect, max_loops))).await.unwrap();

            let architect = engine.results().state(RoleId::InformationArchitect).unwrap();
            assert_eq!(architect.status, RoleStatus::Approved);
            assert_eq!(architect.loops, k - 1);
            assert_eq!(provider.review_calls(), k as usize);
        }
    }

    #[tokio::test]
    async fn test_total_calls_are_bounded() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations((0..10).map(|i| format!("draft {i}")))
                .with_reviews((0..10).map(|_| "REVISE: again")),
        );
        let mut engine = engine_with(&provider);
        let settings = AgentSettings::default()
            .with_max_loops(RoleId::TechnicalReviewer, 1)
            .with_max_loops(RoleId::InformationArchitect, 2)
            .with_max_loops(RoleId::TechnicalEditor, 1);

        engine.run(run_config(settings)).await.unwrap();

        assert_eq!(provider.generation_calls(), 1 + 4);
        assert_eq!(provider.review_calls(), 4);
        assert!(REVIEWERS.iter().all(|r| status_of(&engine, *r) == RoleStatus::SkippedMaxLoops));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn test_empty_revise_feedback_fails_reviewer() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_reviews(["REVISE:   ", "CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);

        engine.run(run_config(AgentSettings::default())).await.unwrap();

        let reviewer = engine.results().state(RoleId::TechnicalReviewer).unwrap();
        assert_eq!(reviewer.status, RoleStatus::Failed);
        assert_eq!(reviewer.loops, 0);
        assert!(engine.results().feedback_log().is_empty());
        assert_eq!(provider.generation_calls(), 1);
    }

    #[tokio::test]
    async fn test_review_call_failure_is_fatal() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_reviews(["CONTINUE"])
                .with_review_error("connection reset"),
        );
        let mut engine = engine_with(&provider);

        let err = engine.run(run_config(AgentSettings::default())).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Provider(ref m) if m == "connection reset"));
        assert_eq!(status_of(&engine, RoleId::TechnicalReviewer), RoleStatus::Approved);
        assert_eq!(status_of(&engine, RoleId::InformationArchitect), RoleStatus::Failed);
        assert_eq!(status_of(&engine, RoleId::TechnicalEditor), RoleStatus::Failed);
        assert_eq!(status_of(&engine, RoleId::TechnicalWriter), RoleStatus::Completed);
        assert!(engine.results().final_document().is_none());
    }

    #[tokio::test]
    async fn test_revision_failure_is_fatal() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_generation_error("API quota exceeded")
                .with_reviews(["REVISE: tighten intro"]),
        );
        let mut engine = engine_with(&provider);

        let err = engine.run(run_config(AgentSettings::default())).await.unwrap_err();

        assert_eq!(err.to_string(), "API quota exceeded");
        assert_eq!(status_of(&engine, RoleId::TechnicalWriter), RoleStatus::Failed);
        assert_eq!(status_of(&engine, RoleId::TechnicalReviewer), RoleStatus::Failed);
        assert_eq!(engine.results().feedback_log().len(), 1);
        assert_eq!(engine.current_document(), Some("draft"));
    }

    #[tokio::test]
    async fn test_preconditions_do_not_touch_state() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut engine = engine_with(&provider);

        let missing =
            WorkflowRunConfig { source_content: SOURCE.to_string(), ..Default::default() };
        assert_eq!(engine.run(missing).await.unwrap_err(), WorkflowError::NoProfileSelected);

        let unknown = WorkflowRunConfig::new("profile_reference", SOURCE);
        assert!(matches!(
            engine.run(unknown).await.unwrap_err(),
            WorkflowError::ProfileNotFound(ref id) if id == "profile_reference"
        ));

        let blank = WorkflowRunConfig::new(HOWTO, "   ");
        assert_eq!(engine.run(blank).await.unwrap_err(), WorkflowError::EmptySource);

        assert_eq!(provider.generation_calls() + provider.review_calls(), 0);
        assert!(engine.results().runtime_states().iter().all(|s| s.status == RoleStatus::Pending));
        assert_eq!(engine.log().len(), 3);
        assert!(engine.log().iter().all(|e| e.level == LogLevel::Error));
    }
}

// ============================================================================
// Reset & Prompts
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_reset_after_failed_run() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_reviews(["REVISE: more detail"])
                .with_generation_error("boom"),
        );
        let mut engine = engine_with(&provider);
        let _ = engine.run(run_config(AgentSettings::default())).await;
        assert!(engine.error_message().is_some());

        for _ in 0..2 {
            engine.reset();
            assert!(engine.log().is_empty());
            assert!(engine.results().feedback_log().is_empty());
            assert!(engine.results().final_document().is_none());
            assert!(engine.error_message().is_none());
            let states = engine.results().runtime_states();
            assert!(states.iter().all(|s| s.status == RoleStatus::Pending));
        }
    }

    #[tokio::test]
    async fn test_second_run_starts_fresh() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["first", "second"])
                .with_reviews(["CONTINUE"; 6]),
        );
        let mut engine = engine_with(&provider);

        engine.run(run_config(AgentSettings::default())).await.unwrap();
        let first_len = engine.log().len();
        let document = engine.run(run_config(AgentSettings::default())).await.unwrap();

        assert_eq!(document, "second");
        assert_eq!(engine.log().len(), first_len);
        let first = &engine.log().entries()[0].message;
        assert!(first.starts_with("Workflow started for profile: \"How-to guide\""));
    }

    #[tokio::test]
    async fn test_prompts_follow_reviewer_focus() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_generations(["draft"])
                .with_reviews(["CONTINUE", "CONTINUE", "CONTINUE"]),
        );
        let mut engine = engine_with(&provider);
        let settings = AgentSettings {
            writing_style_guide: "Prefer the active voice.".to_string(),
            ..AgentSettings::with_default_guidance()
        };

        engine
            .run(run_config(settings).with_supporting("fn deploy() {}"))
            .await
            .unwrap();

        let generation = &provider.generation_prompts()[0];
        assert!(generation.contains(SOURCE));
        assert!(generation.contains("fn deploy() {}"));
        assert!(generation.contains("Prefer the active voice."));

        let reviews = provider.review_prompts();
        assert!(reviews[0].contains("Original source for cross-referencing"));
        assert!(reviews[0].contains("fn deploy() {}"));
        assert!(!reviews[0].contains("Prefer the active voice."));
        assert!(reviews[1..].iter().all(|r| !r.contains("fn deploy() {}")));
        assert!(!reviews[1].contains(SOURCE));
        assert!(reviews[1].contains("Prefer the active voice."));
        assert!(reviews[2].contains("technical editing"));
    }
}
