//! docflow - multi-role LLM workflow for technical documents.
//!
//! Drafts a document from source material and runs it past a chain of
//! reviewer roles, writing the final document and the review feedback log.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docflow::core::Config;
use docflow::llm::{create_provider, LlmProvider, ScriptedProvider};
use docflow::workflow::{
    document_filename, format_feedback_log, RoleId, WorkflowEngine, WorkflowError, WorkflowEvent,
    WorkflowRunConfig,
};

/// File name of the exported review feedback log.
const FEEDBACK_LOG_FILE: &str = "review_feedback_log.txt";

/// Draft and review technical documents with a team of LLM roles
#[derive(Parser)]
#[command(name = "docflow")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (overrides .docflow.toml and the global config)
    #[arg(long, global = true, env = "DOCFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the writing and review workflow
    Run {
        /// Document profile id (see `docflow profiles`)
        #[arg(short, long)]
        profile: Option<String>,

        /// Workflow id (see `docflow workflows`)
        #[arg(short, long)]
        workflow: Option<String>,

        /// File with the source material
        #[arg(short, long)]
        source: PathBuf,

        /// File with authoritative supporting content (e.g. source code)
        #[arg(long)]
        supporting: Option<PathBuf>,

        /// Directory the document and feedback log are written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Override a reviewer's loop bound (ROLE=N, e.g. technical-editor=1)
        #[arg(long = "max-loops", value_name = "ROLE=N")]
        max_loops: Vec<String>,

        /// Run offline with a scripted provider that approves everything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the roles of a workflow
    Roles {
        /// Workflow id (defaults to the standard pipeline)
        #[arg(short, long)]
        workflow: Option<String>,
    },

    /// List the available workflows
    Workflows,

    /// List the available document profiles
    Profiles {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Run { profile, workflow, source, supporting, output, max_loops, dry_run } => {
            let args =
                RunArgs { profile, workflow, source, supporting, output, max_loops, dry_run };
            cmd_run(cli.config.as_deref(), args)?;
        }
        Commands::Roles { workflow } => cmd_roles(cli.config.as_deref(), workflow.as_deref())?,
        Commands::Workflows => cmd_workflows(cli.config.as_deref())?,
        Commands::Profiles { format } => cmd_profiles(cli.config.as_deref(), &format)?,
        Commands::Config { path } => cmd_config(cli.config.as_deref(), path)?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}

struct RunArgs {
    profile: Option<String>,
    workflow: Option<String>,
    source: PathBuf,
    supporting: Option<PathBuf>,
    output: PathBuf,
    max_loops: Vec<String>,
    dry_run: bool,
}

/// Parse a `ROLE=N` loop override.
fn parse_max_loops(value: &str) -> Result<(RoleId, u32)> {
    let (role, count) = value
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid --max-loops '{value}', expected ROLE=N"))?;

    let role = RoleId::from_slug(role)
        .ok_or_else(|| anyhow::anyhow!("Unknown role '{}'", role.trim()))?;
    if role == RoleId::TechnicalWriter {
        anyhow::bail!("The technical writer has no loop bound");
    }
    let count = count
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid loop count in '{value}'"))?;

    Ok((role, count))
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run the workflow.
fn cmd_run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = Config::load_with(config_path)?;

    let source_content = read_input(&args.source)?;
    let supporting_content = match &args.supporting {
        Some(path) => read_input(path)?,
        None => String::new(),
    };

    // checked before the provider so a missing profile is reported first
    let profiles = config.profile_catalog();
    let profile_name = match args.profile.as_deref() {
        None => anyhow::bail!("{}", WorkflowError::NoProfileSelected),
        Some(id) => match profiles.get(id) {
            Some(profile) => profile.name.clone(),
            None => anyhow::bail!("{}", WorkflowError::ProfileNotFound(id.to_string())),
        },
    };
    let registry = config.role_registry(args.workflow.as_deref())?;

    let mut settings = config.agent_settings();
    for value in &args.max_loops {
        let (role, count) = parse_max_loops(value)?;
        settings.max_loops.insert(role, count);
    }

    let provider: Arc<dyn LlmProvider> = if args.dry_run {
        Arc::new(ScriptedProvider::dry_run())
    } else {
        let provider_config = config.provider_config().ok_or_else(|| {
            anyhow::anyhow!(
                "No LLM provider configured.\n\
                 Set OPENAI_API_KEY, AZURE_OPENAI_API_KEY (with AZURE_OPENAI_ENDPOINT and \
                 AZURE_OPENAI_DEPLOYMENT) or GEMINI_API_KEY, or add an [llm] section to the config."
            )
        })?;
        create_provider(&provider_config)?
    };

    let run_config = WorkflowRunConfig {
        profile_id: args.profile,
        source_content,
        supporting_content,
        settings,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut engine = WorkflowEngine::new(provider)
            .with_profiles(profiles)
            .with_registry(registry)
            .with_events(tx);

        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_event(&event);
            }
        });

        let outcome = tokio::select! {
            result = engine.run(run_config) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        let document = match outcome {
            Some(Ok(document)) => document,
            Some(Err(e)) => {
                drop(engine);
                printer.await.ok();
                anyhow::bail!("Workflow failed: {e}");
            }
            None => {
                drop(engine);
                printer.await.ok();
                anyhow::bail!("Workflow cancelled");
            }
        };

        let feedback_log = format_feedback_log(engine.results().feedback_log());
        let states = engine.results().runtime_states().to_vec();
        drop(engine);
        printer.await.ok();

        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        let document_path = args
            .output
            .join(document_filename(&profile_name, chrono::Local::now().date_naive()));
        std::fs::write(&document_path, &document)?;
        let log_path = args.output.join(FEEDBACK_LOG_FILE);
        std::fs::write(&log_path, feedback_log)?;

        println!();
        for state in &states {
            let name = state.role.name();
            match state.max_loops {
                Some(max) => {
                    println!("  {:<24} {} ({}/{} loops)", name, state.status, state.loops, max);
                }
                None => println!("  {:<24} {}", name, state.status),
            }
        }
        println!();
        println!("Document:     {}", document_path.display());
        println!("Feedback log: {}", log_path.display());

        Ok(())
    })
}

fn print_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::Log(entry) => println!("{}", entry.to_line()),
        WorkflowEvent::RoleUpdated(state) => {
            tracing::debug!(
                role = state.role.name(),
                status = %state.status,
                loops = state.loops,
                "role updated"
            );
        }
        WorkflowEvent::DocumentUpdated(document) => {
            tracing::debug!(chars = document.chars().count(), "document updated");
        }
    }
}

/// List the roles of a workflow.
fn cmd_roles(config_path: Option<&Path>, workflow: Option<&str>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let registry = config.role_registry(workflow)?;

    for role in registry.list_roles() {
        let bound = match role.default_max_loops {
            Some(max) => format!("max loops: {max}"),
            None => "writer".to_string(),
        };
        let id = role.id;
        println!("{:<24} {:<24} {:<14} {}", id.name(), id.slug(), bound, role.description);
    }

    Ok(())
}

/// List the available workflows.
fn cmd_workflows(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let workflows = config.workflow_catalog();

    for workflow in &workflows {
        println!("{} - {}", workflow.id, workflow.name);
        println!("    {}", workflow.roles.join(" -> "));
    }
    println!("\nTotal: {} workflows", workflows.len());

    Ok(())
}

/// List document profiles.
fn cmd_profiles(config_path: Option<&Path>, format: &str) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let catalog = config.profile_catalog();

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(catalog.all())?;
            println!("{json}");
        }
        _ => {
            for profile in catalog.all() {
                println!("{} - {}", profile.id, profile.name);
                if !profile.description.is_empty() {
                    println!("    {}", profile.description);
                }
            }
            println!("\nTotal: {} profiles", catalog.len());
        }
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(config_path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Config::resolve_path)
            .or_else(Config::global_path);
        if let Some(path) = path {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = Config::load_with(config_path)?;
    let toml = toml::to_string_pretty(&config.redacted())?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "docflow", &mut io::stdout());
}
