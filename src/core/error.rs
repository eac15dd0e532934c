//! Error handling for stacksynth
//!
//! Synthesis is all-or-nothing: every failure surfaces synchronously from
//! [`Synthesizer::synthesize`](crate::synth::Synthesizer::synthesize) as a [`SynthError`]
//! and no partial document is produced. The error system has two layers:
//!
//! - [`SynthError`] - strongly-typed failure kinds for code that matches on them
//! - [`ErrorContext`] - a wrapper adding details and suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Composition**: [`SynthError::DuplicateNode`], [`SynthError::UnknownTarget`],
//!   [`SynthError::UnknownAttributeKind`], [`SynthError::InvalidPropertyValue`]
//! - **Graph**: [`SynthError::CyclicDependency`]
//! - **Naming**: [`SynthError::NameCollision`]
//! - **Resolution**: [`SynthError::MissingRequiredProperty`],
//!   [`SynthError::UnresolvedReference`] (internal, indicates an engine defect)
//! - **Inputs**: [`SynthError::InvalidDefinition`], [`SynthError::InvalidResourceType`]
//!
//! None of these are retried. Retry policy belongs to whatever deploys the document.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stacksynth::core::{SynthError, user_friendly_error};
//!
//! let error = SynthError::CyclicDependency {
//!     path: vec!["a".into(), "b".into(), "a".into()],
//! };
//! assert_eq!(error.kind(), "cyclic-dependency");
//! assert_eq!(error.node_id(), Some("a"));
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored output on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::ResourceType;

/// The main error type for synthesis.
///
/// Each variant names one failure mode and carries the ids needed to diagnose it.
/// Only [`UnresolvedReference`](SynthError::UnresolvedReference) signals a bug in the
/// engine itself; everything else is a problem with the composed stack or its inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    /// Two nodes were registered under the same logical id.
    #[error("Resource '{id}' is already defined in this stack")]
    DuplicateNode {
        /// The repeated logical id
        id: String,
    },

    /// A reference or `dependsOn` entry names a node that is not in the stack.
    #[error("Resource '{node_id}' references '{target}', which is not defined in this stack")]
    UnknownTarget {
        /// Node holding the dangling reference
        node_id: String,
        /// The missing target id
        target: String,
    },

    /// A reference asks for an attribute the target's type does not expose.
    #[error(
        "Resource '{node_id}' references '{target}.{attribute}', but {resource_type} resources do not expose '{attribute}'"
    )]
    UnknownAttributeKind {
        /// Node (or output) holding the reference
        node_id: String,
        /// Node whose attribute was requested
        target: String,
        /// Type of the target
        resource_type: ResourceType,
        /// The requested attribute
        attribute: String,
        /// Closest exposed attribute, when one is near enough to be a typo
        suggestion: Option<String>,
    },

    /// The dependency graph contains a cycle. `path` starts and ends on the same node.
    #[error("Cyclic dependency detected: {}", path.join(" → "))]
    CyclicDependency {
        /// Node ids along the cycle, closing on the first
        path: Vec<String>,
    },

    /// Two nodes of the same type were assigned one physical name.
    #[error("Physical name '{name}' is assigned to more than one resource: {}", node_ids.join(", "))]
    NameCollision {
        /// The colliding physical name
        name: String,
        /// Every node sharing it, ascending
        node_ids: Vec<String>,
    },

    /// A property the node's type requires was never set.
    #[error("Resource '{node_id}' is missing required property '{property}'")]
    MissingRequiredProperty {
        /// Offending node
        node_id: String,
        /// The absent property
        property: String,
    },

    /// A property value could not be turned into a literal.
    #[error("Invalid value for property '{property}' of resource '{node_id}': {reason}")]
    InvalidPropertyValue {
        /// Offending node
        node_id: String,
        /// Property name
        property: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A reference was looked up before its target was resolved.
    ///
    /// The topological order makes this unreachable for a correct engine. Seeing it means
    /// the ordering or an attribute producer is broken, not the input.
    #[error(
        "Internal error: '{node_id}' needs '{target}.{attribute}', which has not been resolved"
    )]
    UnresolvedReference {
        /// Node (or output) doing the lookup
        node_id: String,
        /// Target node id
        target: String,
        /// Target attribute
        attribute: String,
    },

    /// Unknown resource type name in a definition or on the command line.
    #[error("Invalid resource type: {resource_type}")]
    InvalidResourceType {
        /// The unparseable name
        resource_type: String,
    },

    /// A stack definition file is malformed.
    #[error("Invalid stack definition: {reason}")]
    InvalidDefinition {
        /// What was wrong
        reason: String,
    },
}

impl SynthError {
    /// Stable kebab-case name of the failure kind, printed by the CLI.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateNode { .. } => "duplicate-node",
            Self::UnknownTarget { .. } => "unknown-target",
            Self::UnknownAttributeKind { .. } => "unknown-attribute-kind",
            Self::CyclicDependency { .. } => "cyclic-dependency",
            Self::NameCollision { .. } => "name-collision",
            Self::MissingRequiredProperty { .. } => "missing-required-property",
            Self::InvalidPropertyValue { .. } => "invalid-property-value",
            Self::UnresolvedReference { .. } => "unresolved-reference",
            Self::InvalidResourceType { .. } => "invalid-resource-type",
            Self::InvalidDefinition { .. } => "invalid-definition",
        }
    }

    /// Logical id of the node the failure is about, if there is one.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::DuplicateNode { id } => Some(id),
            Self::UnknownTarget { node_id, .. }
            | Self::UnknownAttributeKind { node_id, .. }
            | Self::MissingRequiredProperty { node_id, .. }
            | Self::InvalidPropertyValue { node_id, .. }
            | Self::UnresolvedReference { node_id, .. } => Some(node_id),
            Self::CyclicDependency { path } => path.first().map(String::as_str),
            Self::NameCollision { node_ids, .. } => node_ids.first().map(String::as_str),
            Self::InvalidResourceType { .. } | Self::InvalidDefinition { .. } => None,
        }
    }

    /// True when the error reveals a defect in the engine rather than in the input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }
}

/// Error wrapper with user-facing details and a suggestion.
///
/// The CLI converts every failure into one of these through [`user_friendly_error`]
/// and prints it with [`display`](ErrorContext::display).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error, when the failure maps onto a [`SynthError`]
    pub error: Option<SynthError>,
    /// Message used when there is no typed error
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context around a typed error.
    #[must_use]
    pub fn new(error: SynthError) -> Self {
        Self {
            message: error.to_string(),
            error: Some(error),
            suggestion: None,
            details: None,
        }
    }

    /// Create a context for an untyped failure.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Error kind label, `"error"` for untyped failures.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.error.as_ref().map_or("error", SynthError::kind)
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error kind and message: red and bold
    /// - Failing node id: cyan
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", format!("error[{}]", self.kind()).red().bold(), self.message);

        if let Some(node_id) = self.error.as_ref().and_then(SynthError::node_id) {
            eprintln!("{}: {}", "node".cyan(), node_id);
        }

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.kind(), self.message)?;

        if let Some(node_id) = self.error.as_ref().and_then(SynthError::node_id) {
            write!(f, "\nNode: {node_id}")?;
        }

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Walks the `anyhow` chain looking for a [`SynthError`] so that errors wrapped with
/// `.context(...)` at the CLI layer still get their tailored suggestions. I/O errors get
/// file-oriented guidance; anything else is reported with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(synth_error) = error.chain().find_map(|cause| cause.downcast_ref::<SynthError>()) {
        return create_error_context(synth_error.clone());
    }

    if let Some(io_error) = error.chain().find_map(|cause| cause.downcast_ref::<std::io::Error>()) {
        let ctx = ErrorContext::message(format!("{error:#}"));
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ctx
                .with_suggestion("Check that the file exists and the path is correct")
                .with_details("A required input or output path could not be found"),
            std::io::ErrorKind::PermissionDenied => ctx
                .with_suggestion("Check the file permissions or choose another output path")
                .with_details("stacksynth was not allowed to read or write the file"),
            _ => ctx,
        };
    }

    ErrorContext::message(format!("{error:#}"))
}

fn create_error_context(error: SynthError) -> ErrorContext {
    match &error {
        SynthError::DuplicateNode { .. } => {
            let ctx = ErrorContext::new(error);
            ctx.with_suggestion("Give every resource a unique logical id")
        }
        SynthError::UnknownTarget { target, .. } => {
            let suggestion = format!("Define a resource with id '{target}' or fix the reference");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        SynthError::UnknownAttributeKind {
            resource_type,
            suggestion,
            ..
        } => {
            let exposed = resource_type.schema().attributes.join(", ");
            let details = if exposed.is_empty() {
                format!("'{resource_type}' resources expose no attributes")
            } else {
                format!("'{resource_type}' resources expose: {exposed}")
            };
            let hint = suggestion
                .as_ref()
                .map_or_else(|| "Reference one of the exposed attributes".to_string(), |s| {
                    format!("Did you mean '{s}'?")
                });
            ErrorContext::new(error).with_details(details).with_suggestion(hint)
        }
        SynthError::CyclicDependency { .. } => ErrorContext::new(error)
            .with_details("Every reference and explicit dependency adds an edge to the graph")
            .with_suggestion("Remove one of the references or dependsOn entries along the cycle"),
        SynthError::NameCollision { .. } => ErrorContext::new(error)
            .with_details("Resources of the same type must have distinct physical names")
            .with_suggestion("Rename one of the resources or drop its explicit physical name"),
        SynthError::MissingRequiredProperty { .. } => ErrorContext::new(error)
            .with_suggestion("Set the property on the resource before synthesizing"),
        SynthError::InvalidPropertyValue { .. } => ErrorContext::new(error)
            .with_suggestion("Only strings, numbers and booleans can be joined"),
        SynthError::UnresolvedReference { .. } => ErrorContext::new(error)
            .with_details("This is a defect in stacksynth's resolution order, not in your stack")
            .with_suggestion("Please report this issue with the stack that triggered it"),
        SynthError::InvalidResourceType { .. } => {
            let known: Vec<&str> = ResourceType::ALL.iter().map(ResourceType::as_str).collect();
            ErrorContext::new(error).with_details(format!("Known types: {}", known.join(", ")))
        }
        SynthError::InvalidDefinition { .. } => ErrorContext::new(error)
            .with_suggestion("Check the stack file against the documented definition format"),
    }
}
