//! Test utilities for stacksynth
//!
//! Available to unit tests and, through the `test-utils` feature, to the integration
//! suite.
//!
//! - [`init_test_logging`] - one-time tracing setup for tests
//! - [`fixtures`] - ready-made stacks and stack files
//!
//! # Example
//!
//! ```rust,no_run
//! use stacksynth::synth::Synthesizer;
//! use stacksynth::test_utils::{fixtures, init_test_logging};
//!
//! init_test_logging(None);
//! let stack = fixtures::key_bucket_policy_stack();
//! let result = Synthesizer::new().synthesize(&stack).unwrap();
//! assert_eq!(result.order, vec!["key", "bucket", "policy"]);
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used; otherwise
/// `RUST_LOG` is honored when present and logging stays off when it is not.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Environment lookup backed by a fixed map, for code that takes an `env` closure.
///
/// ```rust,no_run
/// use stacksynth::config::{ContextOverrides, Settings};
/// use stacksynth::test_utils::fake_env;
///
/// let env = fake_env(&[("ENVIRONMENT_SUFFIX", "qa")]);
/// let context = Settings::default().build_context(&ContextOverrides::default(), &env);
/// assert_eq!(context.suffix(), "qa");
/// ```
pub fn fake_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: HashMap<String, String> =
        vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |name: &str| vars.get(name).cloned()
}
