//! Resource nodes
//!
//! A [`ResourceNode`] is one logical resource: a unique id, a [`ResourceType`], a
//! property map of [`Value`]s, tags, and explicit ordering hints. Nodes are plain data.
//! They do nothing until a [`Synthesizer`](crate::synth::Synthesizer) runs, and after a
//! node is added to a [`Stack`](super::Stack) only tag merging touches it.

use std::collections::{BTreeMap, BTreeSet};

use super::value::{Reference, Value};
use crate::core::{ResourceType, SynthError};

/// Largest edit distance at which an exposed attribute is offered as a suggestion.
const SUGGESTION_DISTANCE: usize = 3;

/// A named, typed unit of infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    id: String,
    resource_type: ResourceType,
    properties: BTreeMap<String, Value>,
    tags: BTreeMap<String, String>,
    depends_on: BTreeSet<String>,
    physical_name: Option<String>,
}

impl ResourceNode {
    /// Create an empty node.
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
            properties: BTreeMap::new(),
            tags: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            physical_name: None,
        }
    }

    /// Logical id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resource kind.
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Store a property, replacing any earlier value under the same name.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`set_property`](Self::set_property).
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Set a node-local tag. Node-local tags win over global tags.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder form of [`set_tag`](Self::set_tag).
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_tag(key, value);
        self
    }

    /// Require `id` to be resolved before this node even without a reference to it.
    pub fn add_dependency(&mut self, id: impl Into<String>) -> &mut Self {
        self.depends_on.insert(id.into());
        self
    }

    /// Builder form of [`add_dependency`](Self::add_dependency).
    #[must_use]
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.add_dependency(id);
        self
    }

    /// Pin the physical name instead of deriving it from the naming convention.
    #[must_use]
    pub fn with_physical_name(mut self, name: impl Into<String>) -> Self {
        self.physical_name = Some(name.into());
        self
    }

    /// Build a reference to one of this node's attributes.
    ///
    /// Fails fast with [`SynthError::UnknownAttributeKind`] if the node's type does not
    /// expose `attribute`. The target's existence in a stack is checked later, at
    /// synthesis, because forward references are legal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stacksynth::core::ResourceType;
    /// use stacksynth::stack::ResourceNode;
    ///
    /// let key = ResourceNode::new("key", ResourceType::Key);
    /// assert!(key.reference("arn").is_ok());
    /// assert!(key.reference("name").is_err());
    /// ```
    pub fn reference(&self, attribute: &str) -> Result<Value, SynthError> {
        reference_to(&self.id, &self.id, self.resource_type, attribute)
    }

    /// Property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All properties, ascending by name.
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Node-local tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub(crate) fn tags_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.tags
    }

    /// Explicit ordering hints.
    #[must_use]
    pub const fn explicit_dependencies(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    /// Pinned physical name, if any.
    #[must_use]
    pub fn physical_name(&self) -> Option<&str> {
        self.physical_name.as_deref()
    }

    /// Every reference held anywhere in the property tree, in property order.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        for value in self.properties.values() {
            value.visit_references(&mut |r| refs.push(r));
        }
        refs
    }

    /// Ids this node must be resolved after: reference targets plus explicit hints.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<&str> {
        let mut deps: BTreeSet<&str> = self.depends_on.iter().map(String::as_str).collect();
        deps.extend(self.references().into_iter().map(|r| r.target.as_str()));
        deps
    }
}

/// Build a reference held by `owner` after checking `attribute` against the target's
/// `resource_type`.
pub(crate) fn reference_to(
    owner: &str,
    target: &str,
    resource_type: ResourceType,
    attribute: &str,
) -> Result<Value, SynthError> {
    if resource_type.exposes(attribute) {
        return Ok(Value::Reference(Reference::new(target, attribute)));
    }

    Err(SynthError::UnknownAttributeKind {
        node_id: owner.to_string(),
        target: target.to_string(),
        resource_type,
        attribute: attribute.to_string(),
        suggestion: closest_attribute(resource_type, attribute),
    })
}

fn closest_attribute(resource_type: ResourceType, attribute: &str) -> Option<String> {
    resource_type
        .schema()
        .attributes
        .iter()
        .map(|candidate| (strsim::levenshtein(candidate, attribute), *candidate))
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .min()
        .map(|(_, candidate)| candidate.to_string())
}
