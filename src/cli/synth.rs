//! Synthesize a stack into a deployment template.
//!
//! # Examples
//!
//! ```bash
//! # Blueprint, default environment, JSON on stdout
//! stacksynth synth
//!
//! # Feature environment, YAML written to a file
//! stacksynth synth -c environmentSuffix=pr42 --format yaml --output template.yaml
//!
//! # Custom stack, resolved one node at a time
//! stacksynth synth --stack stack.yaml --sequential
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{context_overrides, load_context, load_stack, parse_key_val};
use crate::synth::{NamingConvention, Synthesizer, TemplateFormat};

/// Command to synthesize a template.
#[derive(Args, Debug)]
pub struct SynthCommand {
    /// Stack definition file (YAML, or JSON by `.json` extension)
    ///
    /// Without it the built-in secure web application blueprint is synthesized.
    #[arg(short, long, value_name = "FILE")]
    stack: Option<PathBuf>,

    /// Write the template here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Template format
    #[arg(short, long, value_enum, default_value_t = TemplateFormat::Json)]
    format: TemplateFormat,

    /// Resolve the nodes of each level one at a time
    #[arg(long)]
    sequential: bool,

    /// Context value, repeatable (`environmentSuffix` is recognized)
    #[arg(short = 'c', long = "context", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    context: Vec<(String, String)>,

    /// Repository tag (overrides `$REPOSITORY`)
    #[arg(long)]
    repository: Option<String>,

    /// Author tag (overrides `$COMMIT_AUTHOR`)
    #[arg(long)]
    author: Option<String>,
}

impl SynthCommand {
    /// Execute the synth command.
    pub fn execute(self, config: &CliConfig, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        let overrides = context_overrides(&self.context, self.repository, self.author);
        let (settings, context) = load_context(config.config_path.as_deref(), &overrides, env)?;
        let stack = load_stack(self.stack.as_deref(), context)?;

        let mut synthesizer = Synthesizer::new()
            .with_naming(NamingConvention::new(settings.naming_prefix()))
            .with_parallel(!self.sequential);
        let result = synthesizer
            .synthesize(&stack)
            .with_context(|| format!("Failed to synthesize stack '{}'", stack.name()))?;

        let rendered = result.template.render(self.format)?;

        match self.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create output directory: {}", parent.display())
                        })?;
                    }
                }
                std::fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write template: {}", path.display()))?;
                tracing::info!(
                    "{} {} ({} resources) to {}",
                    "Wrote".green(),
                    stack.name(),
                    result.template.resources.len(),
                    path.display()
                );
            }
            None => print!("{rendered}"),
        }

        Ok(())
    }
}
