//! Configuration for stacksynth
//!
//! Two pieces feed every synthesis run:
//!
//! - [`EnvironmentContext`] - the immutable description of the target environment
//!   (suffix, optional account and region, global tags) threaded explicitly into a
//!   [`Stack`](crate::stack::Stack)
//! - [`Settings`] - the optional TOML settings file, merged with environment variables
//!   and command-line values by [`Settings::build_context`]
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (`-c environmentSuffix=...`, `--repository`, `--author`)
//! 2. Environment variables (`ENVIRONMENT_SUFFIX`, `REPOSITORY`, `COMMIT_AUTHOR`,
//!    `CDK_DEFAULT_ACCOUNT`, `CDK_DEFAULT_REGION`)
//! 3. Settings file (`--config` or `STACKSYNTH_CONFIG`)
//! 4. Default values
//!
//! Environment lookups go through a caller-supplied function so that tests and embedders
//! never have to mutate the process environment.
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::config::{ContextOverrides, Settings};
//!
//! let overrides = ContextOverrides {
//!     suffix: Some("pr42".to_string()),
//!     ..ContextOverrides::default()
//! };
//! let context = Settings::default().build_context(&overrides, |_| None);
//! assert_eq!(context.suffix(), "pr42");
//! assert_eq!(context.global_tags()["Repository"], "unknown");
//! ```

pub mod context;
pub mod settings;

pub use context::EnvironmentContext;
pub use settings::{ContextOverrides, EnvironmentSettings, NamingSettings, Settings, process_env};
