//! Stack composition
//!
//! A [`Stack`] owns every [`ResourceNode`] of one deployment unit, the declared
//! [`Output`]s, and the [`EnvironmentContext`] it is synthesized for. Composition is a
//! single-writer phase: callers add nodes and outputs, references may point forward at
//! nodes added later, and nothing is validated beyond attribute kinds until
//! [`Stack::validate`] runs at the start of synthesis.
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::config::EnvironmentContext;
//! use stacksynth::core::ResourceType;
//! use stacksynth::stack::{Output, ResourceNode, Stack, Value};
//!
//! # fn main() -> Result<(), stacksynth::core::SynthError> {
//! let mut stack = Stack::new("Demo", EnvironmentContext::new("dev"));
//!
//! let key = ResourceNode::new("key", ResourceType::Key)
//!     .with_property("KeyPolicy", Value::literal(serde_json::json!({"Version": "2012-10-17"})));
//! let bucket = ResourceNode::new("bucket", ResourceType::Bucket)
//!     .with_property("KmsMasterKeyId", key.reference("arn")?);
//! stack.add(key)?;
//! stack.add(bucket)?;
//!
//! stack.add_output("BucketArn", Output::new(stack.reference("bucket", "arn")?));
//! stack.validate()?;
//! # Ok(())
//! # }
//! ```

pub mod definition;
pub mod node;
pub mod value;

pub use definition::{OutputDefinition, ResourceDefinition, StackDefinition};
pub use node::ResourceNode;
pub use value::{Literal, Reference, Value};

use std::collections::BTreeMap;

use crate::config::EnvironmentContext;
use crate::core::SynthError;

/// A stack-level output, resolved to a literal at synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Value, usually a reference
    pub value: Value,
    /// Human-readable description
    pub description: Option<String>,
    /// Export identifier for cross-stack consumption
    pub export_name: Option<String>,
}

impl Output {
    /// Output with no description or export.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
            export_name: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the export name.
    #[must_use]
    pub fn with_export_name(mut self, export_name: impl Into<String>) -> Self {
        self.export_name = Some(export_name.into());
        self
    }
}

/// All resources and outputs of one deployment unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    name: String,
    description: Option<String>,
    context: EnvironmentContext,
    nodes: BTreeMap<String, ResourceNode>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    /// Create an empty stack for `context`.
    pub fn new(name: impl Into<String>, context: EnvironmentContext) -> Self {
        Self {
            name: name.into(),
            description: None,
            context,
            nodes: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Set the template description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Environment the stack is synthesized for.
    #[must_use]
    pub const fn context(&self) -> &EnvironmentContext {
        &self.context
    }

    /// Register a node. Fails with [`SynthError::DuplicateNode`] if the id is taken.
    pub fn add(&mut self, node: ResourceNode) -> Result<(), SynthError> {
        if self.nodes.contains_key(node.id()) {
            return Err(SynthError::DuplicateNode {
                id: node.id().to_string(),
            });
        }
        tracing::trace!(
            id = node.id(),
            resource_type = %node.resource_type(),
            "Registered resource"
        );
        self.nodes.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Declare an output. A later declaration under the same name replaces the earlier one.
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) {
        let name = name.into();
        if self.outputs.insert(name.clone(), output).is_some() {
            tracing::debug!("Output '{}' was declared twice; keeping the last declaration", name);
        }
    }

    /// Reference an attribute of an already registered node.
    pub fn reference(&self, id: &str, attribute: &str) -> Result<Value, SynthError> {
        let node = self.nodes.get(id).ok_or_else(|| SynthError::UnknownTarget {
            node_id: self.name.clone(),
            target: id.to_string(),
        })?;
        node.reference(attribute)
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.get(id)
    }

    /// Nodes ascending by id.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ResourceNode> {
        self.nodes.values_mut()
    }

    /// Outputs ascending by name.
    #[must_use]
    pub const fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the stack has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check every reference and ordering hint against the registered nodes.
    ///
    /// Runs before the graph is built. Nodes are checked in ascending id order, then
    /// outputs by name, so the first reported problem is stable across runs.
    ///
    /// - a reference or `dependsOn` naming a missing node → [`SynthError::UnknownTarget`]
    /// - a reference to an attribute the target type lacks → [`SynthError::UnknownAttributeKind`]
    pub fn validate(&self) -> Result<(), SynthError> {
        for node in self.nodes.values() {
            for dep in node.explicit_dependencies() {
                if !self.nodes.contains_key(dep) {
                    return Err(SynthError::UnknownTarget {
                        node_id: node.id().to_string(),
                        target: dep.clone(),
                    });
                }
            }
            for value in node.properties().values() {
                self.validate_value(node.id(), value)?;
            }
        }

        for (name, output) in &self.outputs {
            self.validate_value(name, &output.value)?;
        }

        Ok(())
    }

    fn validate_value(&self, owner: &str, value: &Value) -> Result<(), SynthError> {
        let mut result = Ok(());
        value.visit_references(&mut |reference| {
            if result.is_err() {
                return;
            }
            result = match self.nodes.get(&reference.target) {
                None => Err(SynthError::UnknownTarget {
                    node_id: owner.to_string(),
                    target: reference.target.clone(),
                }),
                Some(target) => node::reference_to(
                    owner,
                    target.id(),
                    target.resource_type(),
                    &reference.attribute,
                )
                .map(|_| ()),
            };
        });
        result
    }
}
