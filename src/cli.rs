//! CLI interface for Quill.
//!
//! Each subcommand is non-interactive: paths in, artifacts or plain text
//! out. Summaries go to stderr so stdout stays pipeable.
//!
//! - `quill run <input> --out <dir>`: run every stage and write artifacts.
//! - `quill labels <artifact>`: list the labels present in an artifact.
//! - `quill plugins`: show the active priority order.

mod format;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use quill::config::{Config, ConfigError};
use quill::pipeline;
use quill::plugin::PluginRegistry;
use quill::priority::{Level, observed_labels};
use quill::similarity::Jaccard;
use quill::storage::{self, Storage};

use format::{format_label_counts, format_priority_order};

/// Quill: label writer behavior in co-writing keystroke logs.
#[derive(Debug, Parser)]
#[command(name = "quill", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. Put thresholds in ~/.quill/config.toml (or pass --config)
  2. quill run sessions.json.zst --out parsed/
  3. quill labels parsed/action_type_with_priority_per_session.json
  4. quill labels parsed/level_3_actions_per_session.json --level 3

Logging: set RUST_LOG (e.g. RUST_LOG=quill=debug)."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse keystroke logs into labeled actions.
    ///
    /// Reads a JSON object of session id to raw events (`.zst` is
    /// decompressed) and writes the four stage artifacts to `--out`.
    /// A per-label summary is printed to stderr.
    Run {
        /// Keystroke log file.
        input: PathBuf,

        /// Directory for the artifacts. Created if missing.
        #[arg(long)]
        out: PathBuf,

        /// Config file (defaults to ~/.quill/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the distinct labels present in an artifact.
    Labels {
        /// An actions artifact written by `quill run`.
        artifact: PathBuf,

        /// Which label to read.
        #[arg(long, value_enum, default_value = "final")]
        level: LevelArg,
    },

    /// Print the active plugins, highest priority first.
    Plugins {
        /// Config file (defaults to ~/.quill/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// CLI-facing label level, mapped to the domain `Level`.
#[derive(Debug, Clone, ValueEnum)]
pub enum LevelArg {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
    #[value(name = "3")]
    Three,
    /// The resolved action type.
    Final,
}

impl LevelArg {
    fn to_domain(&self) -> Level {
        match self {
            Self::One => Level::One,
            Self::Two => Level::Two,
            Self::Three => Level::Three,
            Self::Final => Level::Final,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { input, out, config } => cmd_run(&input, &out, config.as_deref()),
        Command::Labels { artifact, level } => cmd_labels(&artifact, &level),
        Command::Plugins { config } => cmd_plugins(config.as_deref()),
    }
}

fn cmd_run(input: &Path, out: &Path, config: Option<&Path>) -> Result<(), String> {
    let config = Config::load(config).map_err(|e| e.to_string())?;
    let registry = registry_for(&config);

    let sessions =
        storage::load_sessions(input).map_err(|e| format!("failed to read logs: {e}"))?;
    let artifacts = pipeline::run(&sessions, &config, &Jaccard, &registry)
        .map_err(|e| format!("failed to parse logs: {e}"))?;

    let storage = Storage::new(out).map_err(|e| format!("failed to prepare output: {e}"))?;
    artifacts
        .save(&storage)
        .map_err(|e| format!("failed to write artifacts: {e}"))?;

    eprintln!(
        "Parsed {} session(s) into {} action(s) → {}",
        sessions.len(),
        artifacts.action_count(),
        out.display()
    );
    eprint!("{}", format_label_counts(&artifacts.prioritized));
    Ok(())
}

fn cmd_labels(artifact: &Path, level: &LevelArg) -> Result<(), String> {
    let sessions = storage::load_actions(artifact)
        .map_err(|e| format!("failed to read artifact: {e}"))?;
    let labels = observed_labels(&sessions, level.to_domain());

    if labels.is_empty() {
        println!("No labels");
        return Ok(());
    }
    for label in labels {
        println!("{label}");
    }
    Ok(())
}

fn cmd_plugins(config: Option<&Path>) -> Result<(), String> {
    let registry = match Config::load(config) {
        Ok(config) => registry_for(&config),
        // No config at the default location: the built-ins apply.
        Err(ConfigError::NotFound(_)) if config.is_none() => PluginRegistry::builtin(),
        Err(e) => return Err(e.to_string()),
    };

    print!("{}", format_priority_order(&registry.priority_order()));
    Ok(())
}

/// Plugins named in config, or the built-in set.
fn registry_for(config: &Config) -> PluginRegistry {
    match &config.priority.plugins {
        Some(names) => PluginRegistry::from_names(names.iter().cloned()),
        None => PluginRegistry::builtin(),
    }
}
