#![allow(clippy::format_push_string)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_precision_loss)]

//! # docflow
//!
//! Multi-role LLM workflow that drafts and revises technical documents.
//!
//! A Technical Writer drafts a document from your source material, then a
//! Technical Reviewer, an Information Architect and a Technical Editor each
//! review it in turn. Every revision request goes back to the writer, up to
//! a per-reviewer loop bound.
//!
//! ## Features
//!
//! - **Bounded revision loops**: each reviewer gets a fixed number of passes
//! - **Document profiles**: templates and guidance per document type
//! - **Multiple providers**: OpenAI, Azure OpenAI and Google Gemini
//! - **Run telemetry**: timestamped log plus an exportable feedback log
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! docflow run --profile profile_howto_default --source notes.md --output out/
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod core;
pub mod llm;
pub mod workflow;

pub use core::Config;
pub use llm::{LlmError, LlmProvider, ProviderConfig, ProviderKind, ScriptedProvider};
pub use workflow::{
    RoleId, RoleRegistry, RoleStatus, RunResults, WorkflowEngine, WorkflowError, WorkflowEvent,
    WorkflowRunConfig,
};

/// Version of docflow.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const APP_NAME: &str = "docflow";
