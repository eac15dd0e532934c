//! Shared plumbing for the CLI commands.

use anyhow::{Context, Result};
use std::path::Path;

use crate::blueprint;
use crate::config::{ContextOverrides, EnvironmentContext, Settings};
use crate::stack::{Stack, StackDefinition};

/// Context key selecting the environment suffix.
pub const SUFFIX_CONTEXT_KEY: &str = "environmentSuffix";

/// Parse a `KEY=VALUE` pair for `--context`.
///
/// ```rust
/// use stacksynth::cli::parse_key_val;
///
/// assert_eq!(
///     parse_key_val("environmentSuffix=pr7"),
///     Ok(("environmentSuffix".to_string(), "pr7".to_string()))
/// );
/// assert!(parse_key_val("novalue").is_err());
/// ```
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Fold `--context` pairs into overrides. Later pairs win; unknown keys are ignored.
pub fn context_overrides(
    pairs: &[(String, String)],
    repository: Option<String>,
    author: Option<String>,
) -> ContextOverrides {
    let mut overrides = ContextOverrides {
        suffix: None,
        repository,
        author,
    };

    for (key, value) in pairs {
        if key == SUFFIX_CONTEXT_KEY {
            overrides.suffix = Some(value.clone());
        } else {
            tracing::warn!("Ignoring unknown context key '{}'", key);
        }
    }
    overrides
}

/// Load settings and build the environment context.
pub fn load_context(
    config_path: Option<&Path>,
    overrides: &ContextOverrides,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(Settings, EnvironmentContext)> {
    let settings = Settings::load(config_path, env)?;
    let context = settings.build_context(overrides, env);
    tracing::debug!(
        "Environment suffix '{}', account {}, region {}",
        context.suffix(),
        context.account().unwrap_or("(unset)"),
        context.region().unwrap_or("(unset)")
    );
    Ok((settings, context))
}

/// The stack in `stack_file`, or the built-in blueprint when there is none.
pub fn load_stack(stack_file: Option<&Path>, context: EnvironmentContext) -> Result<Stack> {
    match stack_file {
        Some(path) => {
            let definition = StackDefinition::load(path)?;
            definition
                .into_stack(context)
                .with_context(|| format!("Failed to compose stack from {}", path.display()))
        }
        None => {
            tracing::debug!("No stack file given, using the secure web app blueprint");
            blueprint::secure_web_app(context).context("Failed to compose the built-in blueprint")
        }
    }
}
