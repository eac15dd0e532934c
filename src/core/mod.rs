//! Core types for stacksynth
//!
//! This module holds the vocabulary every other module shares:
//!
//! - [`ResourceType`] and [`ResourceSchema`] - the closed set of resource kinds and what
//!   each kind exposes, requires, and how it is named
//! - [`SynthError`] - every failure synthesis can report
//! - [`ErrorContext`] and [`user_friendly_error`] - CLI-facing error presentation
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::core::{ResourceType, SynthError};
//!
//! let kind: ResourceType = "key".parse()?;
//! assert_eq!(kind.schema().attributes, &["arn", "id"]);
//! # Ok::<(), SynthError>(())
//! ```

pub mod error;
pub mod resource;

pub use error::{ErrorContext, SynthError, user_friendly_error};
pub use resource::{ResourceSchema, ResourceType};
