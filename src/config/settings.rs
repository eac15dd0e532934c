//! Settings file and environment defaulting
//!
//! The settings file is optional TOML:
//!
//! ```toml
//! [environment]
//! suffix = "staging"
//! account = "123456789012"
//! region = "us-east-1"
//!
//! [tags]
//! CostCenter = "platform"
//!
//! [naming]
//! prefix = "prod"
//! ```
//!
//! Every value can also come from the process environment or the command line. The
//! precedence, highest first, is: command line, environment variable, settings file,
//! built-in default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::EnvironmentContext;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "STACKSYNTH_CONFIG";
/// Environment variable carrying the environment suffix.
pub const SUFFIX_ENV: &str = "ENVIRONMENT_SUFFIX";
/// Environment variable carrying the repository tag.
pub const REPOSITORY_ENV: &str = "REPOSITORY";
/// Environment variable carrying the author tag.
pub const AUTHOR_ENV: &str = "COMMIT_AUTHOR";
/// Environment variable carrying the target account.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
/// Environment variable carrying the target region.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Value used for the repository and author tags when nothing supplies them.
pub const UNKNOWN: &str = "unknown";

/// Naming prefix used when the settings file does not set one.
pub const DEFAULT_PREFIX: &str = "prod";

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[environment]` table
    pub environment: EnvironmentSettings,
    /// `[tags]` table, applied to every resource
    pub tags: BTreeMap<String, String>,
    /// `[naming]` table
    pub naming: NamingSettings,
}

/// `[environment]` table of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentSettings {
    /// Environment suffix
    pub suffix: Option<String>,
    /// Target account id
    pub account: Option<String>,
    /// Target region
    pub region: Option<String>,
}

/// `[naming]` table of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingSettings {
    /// Leading segment of every derived physical name
    pub prefix: Option<String>,
}

/// Values taken from the command line. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    /// `-c environmentSuffix=...`
    pub suffix: Option<String>,
    /// `--repository`
    pub repository: Option<String>,
    /// `--author`
    pub author: Option<String>,
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist. Without one, the file named by `STACKSYNTH_CONFIG`
    /// (looked up through `env`) is used if that variable is set; otherwise the defaults
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML.
    pub fn load(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path: Option<PathBuf> = match path {
            Some(path) => Some(path.to_path_buf()),
            None => env(CONFIG_ENV).filter(|p| !p.trim().is_empty()).map(PathBuf::from),
        };

        match path {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No settings file given; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Naming prefix, `prod` unless the settings file overrides it.
    #[must_use]
    pub fn naming_prefix(&self) -> &str {
        self.naming.prefix.as_deref().filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_PREFIX)
    }

    /// Build the environment context for one synthesis run.
    ///
    /// Suffix, repository and author follow command line > environment > settings >
    /// default. Account and region come from the environment or the settings file and
    /// are kept only as a pair. Global tags are the `[tags]` table plus `Environment`,
    /// `Repository` and `Author`, which always win over a same-named `[tags]` entry.
    pub fn build_context(
        &self,
        overrides: &ContextOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> EnvironmentContext {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let suffix = non_empty(overrides.suffix.clone())
            .or_else(|| non_empty(env(SUFFIX_ENV)))
            .or_else(|| non_empty(self.environment.suffix.clone()))
            .unwrap_or_else(|| EnvironmentContext::DEFAULT_SUFFIX.to_string());

        let repository = non_empty(overrides.repository.clone())
            .or_else(|| non_empty(env(REPOSITORY_ENV)))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let author = non_empty(overrides.author.clone())
            .or_else(|| non_empty(env(AUTHOR_ENV)))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let account = non_empty(env(ACCOUNT_ENV)).or_else(|| self.environment.account.clone());
        let region = non_empty(env(REGION_ENV)).or_else(|| self.environment.region.clone());

        let context = EnvironmentContext::new(suffix)
            .with_optional_environment(account, region)
            .with_tags(self.tags.clone());
        let environment = context.suffix().to_string();

        context
            .with_tag("Environment", environment)
            .with_tag("Repository", repository)
            .with_tag("Author", author)
    }
}

/// Look a variable up in the real process environment.
#[must_use]
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
