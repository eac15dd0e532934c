//! Command-line interface for stacksynth.
//!
//! # Available Commands
//!
//! - `synth` - synthesize a stack into a deployment template
//! - `graph` - print the dependency structure of a stack
//!
//! Both commands read a stack definition file (`--stack`, YAML or JSON) or, when none is
//! given, compose the built-in secure web application blueprint.
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//! - `--config` - settings file (defaults to `$STACKSYNTH_CONFIG` when set)
//!
//! Logging goes to stderr, so the synthesized document on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen by the flags.
//!
//! # Example
//!
//! ```bash
//! # Blueprint for a feature environment, as YAML
//! stacksynth synth -c environmentSuffix=pr42 --format yaml
//!
//! # Custom stack, written to a file
//! stacksynth --config stacksynth.toml synth --stack stack.yaml --output template.json
//!
//! # Resolution levels
//! stacksynth graph --stack stack.yaml --format levels
//! ```

mod common;
mod graph;
mod synth;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::process_env;

pub use common::parse_key_val;

/// Runtime configuration shared by all commands.
///
/// Built once from the global flags. Holding it in a struct instead of exporting it
/// through environment variables lets tests drive commands with their own settings.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive: `"debug"`, `"info"`, `"error"`
    pub log_level: Option<String>,

    /// Settings file given with `--config`
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Configuration with no log level and no settings file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins over [`log_level`](Self::log_level) when it is set. Calling this
    /// more than once is harmless; only the first call installs a subscriber.
    pub fn init_logging(&self) {
        let filter = match std::env::var("RUST_LOG") {
            Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
            _ => EnvFilter::new(self.log_level.as_deref().unwrap_or("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for stacksynth.
#[derive(Parser, Debug)]
#[command(
    name = "stacksynth",
    about = "Synthesize declarative cloud stacks into deterministic deployment templates",
    version,
    long_about = "stacksynth builds a resource graph from a stack definition, resolves every \
                  cross-resource reference in dependency order, and writes a byte-stable \
                  deployment template."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file (TOML)
    ///
    /// Falls back to `$STACKSYNTH_CONFIG`. Values in the file lose to environment
    /// variables and command-line flags.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize a stack into a deployment template.
    ///
    /// See [`synth::SynthCommand`].
    Synth(synth::SynthCommand),

    /// Print the dependency structure of a stack.
    ///
    /// See [`graph::GraphCommand`].
    Graph(graph::GraphCommand),
}

impl Cli {
    /// Set up logging and run the selected command against the process environment.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config, &process_env)
    }

    /// Configuration derived from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with an explicit configuration and environment lookup.
    pub fn execute_with_config(
        self,
        config: &CliConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<()> {
        match self.command {
            Commands::Synth(cmd) => cmd.execute(config, env),
            Commands::Graph(cmd) => cmd.execute(config, env),
        }
    }
}
