//! Core application services.
//!
//! Configuration loading and resolution into workflow and provider settings.

mod config;

pub use config::{AgentsConfig, Config, LlmConfig, ReviewerConfig, LOCAL_CONFIG_FILE};
