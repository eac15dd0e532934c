//! Built-in stacks.
//!
//! The CLI synthesizes [`secure_web_app`] when no stack file is given. It is also the
//! largest realistic stack in the test suite: thirty-odd resources across six levels,
//! references through joins, explicit dependencies, and every naming override path.
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::blueprint::secure_web_app;
//! use stacksynth::config::EnvironmentContext;
//! use stacksynth::synth::Synthesizer;
//!
//! # fn main() -> Result<(), stacksynth::core::SynthError> {
//! let stack = secure_web_app(EnvironmentContext::new("pr42"))?;
//! assert_eq!(stack.name(), "TapStackpr42");
//!
//! let result = Synthesizer::new().synthesize(&stack)?;
//! assert_eq!(
//!     result.template.output("S3BucketName").and_then(|v| v.as_str()),
//!     Some("prod-pr42-app-bucket")
//! );
//! # Ok(())
//! # }
//! ```

pub mod web_app;

pub use web_app::secure_web_app;
