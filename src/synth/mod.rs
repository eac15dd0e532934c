//! Synthesis pipeline
//!
//! [`Synthesizer::synthesize`] turns a composed [`Stack`] into a [`Template`]. It never
//! mutates the caller's stack: tags and names are applied to a private copy, so running
//! it twice on the same stack yields identical documents.
//!
//! # State Machine
//!
//! ```text
//! Composing ──► GraphBuilt ──► Ordered ──► Resolving ──► Synthesized
//!     │              │                         │
//!     ▼              ▼                         ├──► NameCollisionError
//! CompositionError  CycleError                 ├──► MissingRequiredPropertyError
//!                                              ├──► UnresolvedReferenceError
//!                                              └──► CompositionError
//! ```
//!
//! 1. **Composing** - [`Stack::validate`] checks every reference target and attribute
//! 2. **GraphBuilt** - [`DependencyGraph::build`] adds edges and rejects cycles
//! 3. **Ordered** - topological order and levels, ties broken by ascending id
//! 4. **Resolving** - [`TagPropagator`], then [`NamingConvention`], then one
//!    [`ReferenceResolver`] pass per level. Nodes of a level run in parallel (rayon)
//!    unless parallelism is off, and the first failure by ascending id aborts synthesis.
//!    Names taken from resolved name properties are checked for collisions before the
//!    level's attributes are produced; those attributes are committed only after the
//!    whole level finished
//! 5. **Synthesized** - outputs are resolved and the [`Template`] is assembled
//!
//! Failure is all-or-nothing: no partial template is ever returned.
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::config::EnvironmentContext;
//! use stacksynth::core::ResourceType;
//! use stacksynth::stack::{Output, ResourceNode, Stack, Value};
//! use stacksynth::synth::Synthesizer;
//!
//! # fn main() -> Result<(), stacksynth::core::SynthError> {
//! let mut stack = Stack::new("Demo", EnvironmentContext::new("dev"));
//! let key = ResourceNode::new("key", ResourceType::Key)
//!     .with_property("KeyPolicy", Value::literal(serde_json::json!({"Version": "2012-10-17"})));
//! let bucket = ResourceNode::new("bucket", ResourceType::Bucket)
//!     .with_property("KmsMasterKeyId", key.reference("arn")?);
//! stack.add(bucket)?;
//! stack.add(key)?;
//! stack.add_output("BucketArn", Output::new(stack.reference("bucket", "arn")?));
//!
//! let result = Synthesizer::new().synthesize(&stack)?;
//! assert_eq!(result.order, vec!["key", "bucket"]);
//! assert_eq!(
//!     result.template.output("BucketArn").and_then(|v| v.as_str()),
//!     Some("arn:aws:s3:::prod-dev-bucket")
//! );
//! # Ok(())
//! # }
//! ```

pub mod naming;
pub mod tags;
pub mod template;

pub use naming::{NameTable, NamingConvention};
pub use tags::TagPropagator;
pub use template::{Export, Template, TemplateFormat, TemplateOutput, TemplateResource};

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::SynthError;
use crate::resolver::{
    DependencyGraph, ProducerRegistry, ReferenceResolver, ResolvedAttributes, ResolvedNode,
};
use crate::stack::{ResourceNode, Stack};

/// Where a synthesizer is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthState {
    /// Nodes are being registered; nothing has run yet
    Composing,
    /// The dependency graph exists and is acyclic
    GraphBuilt,
    /// Topological order and levels are computed
    Ordered,
    /// Tags, names and references are being resolved
    Resolving,
    /// A template was produced
    Synthesized,
    /// The graph had a cycle
    CycleError,
    /// Two nodes of one kind got the same physical name
    NameCollisionError,
    /// An attribute was read before it was produced (engine defect)
    UnresolvedReferenceError,
    /// A required property was missing
    MissingRequiredPropertyError,
    /// The stack itself was malformed
    CompositionError,
}

impl SynthState {
    /// Failure state matching `error`.
    #[must_use]
    pub const fn from_error(error: &SynthError) -> Self {
        match error {
            SynthError::CyclicDependency { .. } => Self::CycleError,
            SynthError::NameCollision { .. } => Self::NameCollisionError,
            SynthError::UnresolvedReference { .. } => Self::UnresolvedReferenceError,
            SynthError::MissingRequiredProperty { .. } => Self::MissingRequiredPropertyError,
            SynthError::DuplicateNode { .. }
            | SynthError::UnknownTarget { .. }
            | SynthError::UnknownAttributeKind { .. }
            | SynthError::InvalidPropertyValue { .. }
            | SynthError::InvalidResourceType { .. }
            | SynthError::InvalidDefinition { .. } => Self::CompositionError,
        }
    }

    /// Whether this is one of the failure states.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CycleError
                | Self::NameCollisionError
                | Self::UnresolvedReferenceError
                | Self::MissingRequiredPropertyError
                | Self::CompositionError
        )
    }
}

impl fmt::Display for SynthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composing => "composing",
            Self::GraphBuilt => "graph-built",
            Self::Ordered => "ordered",
            Self::Resolving => "resolving",
            Self::Synthesized => "synthesized",
            Self::CycleError => "cycle-error",
            Self::NameCollisionError => "name-collision-error",
            Self::UnresolvedReferenceError => "unresolved-reference-error",
            Self::MissingRequiredPropertyError => "missing-required-property-error",
            Self::CompositionError => "composition-error",
        };
        f.write_str(name)
    }
}

/// Everything one successful synthesis produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedStack {
    /// The output document
    pub template: Template,
    /// Topological order, dependencies first, ties by ascending id
    pub order: Vec<String>,
    /// Topological levels, each sorted by id
    pub levels: Vec<Vec<String>>,
    /// Physical name of every node by id
    pub physical_names: BTreeMap<String, String>,
    /// Every attribute computed during resolution
    pub attributes: ResolvedAttributes,
}

/// Drives a stack through graph building, ordering, resolution and serialization.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    naming: NamingConvention,
    registry: ProducerRegistry,
    parallel: bool,
    state: SynthState,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// Synthesizer with the default naming prefix, the built-in producers and parallel
    /// level resolution.
    #[must_use]
    pub fn new() -> Self {
        Self {
            naming: NamingConvention::default(),
            registry: ProducerRegistry::with_defaults(),
            parallel: true,
            state: SynthState::Composing,
        }
    }

    /// Use `naming` for physical names.
    #[must_use]
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Use `registry` for attribute producers.
    #[must_use]
    pub fn with_registry(mut self, registry: ProducerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve the nodes of a level concurrently (`true`, default) or one by one.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Current pipeline state.
    #[must_use]
    pub const fn state(&self) -> SynthState {
        self.state
    }

    /// Run the whole pipeline on `stack`.
    ///
    /// On failure the synthesizer is left in the failure state matching the error and no
    /// template is returned.
    pub fn synthesize(&mut self, stack: &Stack) -> Result<SynthesizedStack, SynthError> {
        self.state = SynthState::Composing;
        tracing::info!("Synthesizing stack '{}' ({} resources)", stack.name(), stack.len());

        match self.run(stack) {
            Ok(result) => {
                self.transition(SynthState::Synthesized);
                tracing::info!(
                    "Synthesized '{}': {} resources, {} outputs, {} levels",
                    stack.name(),
                    result.template.resources.len(),
                    result.template.outputs.len(),
                    result.levels.len()
                );
                Ok(result)
            }
            Err(error) => {
                self.transition(SynthState::from_error(&error));
                Err(error)
            }
        }
    }

    fn transition(&mut self, next: SynthState) {
        tracing::debug!("Synthesizer state: {} → {}", self.state, next);
        self.state = next;
    }

    fn run(&mut self, stack: &Stack) -> Result<SynthesizedStack, SynthError> {
        stack.validate()?;

        let graph = DependencyGraph::build(stack)?;
        self.transition(SynthState::GraphBuilt);

        let order = graph.topological_order()?;
        let levels = graph.levels()?;
        self.transition(SynthState::Ordered);

        self.transition(SynthState::Resolving);
        let mut working = stack.clone();
        TagPropagator::apply(&mut working);
        let mut names = self.naming.apply(&mut working)?;

        let resolver = ReferenceResolver::new(&self.registry, working.context());
        let mut attributes = ResolvedAttributes::new();
        let mut template = Template::new(working.description().map(str::to_string));

        for (depth, level) in levels.iter().enumerate() {
            let nodes: Vec<&ResourceNode> =
                level.iter().filter_map(|id| working.node(id)).collect();
            tracing::debug!("Resolving level {} ({} resources)", depth, nodes.len());

            let resolve = |node: &&ResourceNode| {
                resolver.resolve(node, names.get(node.id()), &attributes)
            };

            let results: Vec<Result<ResolvedNode, SynthError>> = if self.parallel {
                nodes.par_iter().map(resolve).collect()
            } else {
                nodes.iter().map(resolve).collect()
            };
            let mut resolved = results.into_iter().collect::<Result<Vec<_>, _>>()?;

            for node in &resolved {
                if names.get(&node.id).is_none() {
                    names.claim(node.resource_type, &node.id, &node.physical_name);
                }
            }
            names.check_unique()?;

            if self.parallel {
                resolved.par_iter_mut().for_each(|node| resolver.produce(node));
            } else {
                resolved.iter_mut().for_each(|node| resolver.produce(node));
            }

            // Level barrier: nothing from this level is visible until all of it resolved.
            for node in resolved {
                attributes.insert_all(&node.id, node.attributes.clone());
                template.resources.insert(node.id.clone(), node.into());
            }
        }

        for (name, output) in working.outputs() {
            let value = resolver.resolve_value(name, "Value", &output.value, &attributes)?;
            template.outputs.insert(
                name.clone(),
                TemplateOutput {
                    value,
                    description: output.description.clone(),
                    export: output.export_name.clone().map(|name| Export { name }),
                },
            );
        }

        Ok(SynthesizedStack {
            template,
            order,
            levels,
            physical_names: names.into_names(),
            attributes,
        })
    }
}
