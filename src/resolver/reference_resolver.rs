//! Reference resolution.
//!
//! [`ReferenceResolver`] turns one node's property tree into literals by looking every
//! [`Reference`](crate::stack::Reference) up in [`ResolvedAttributes`] and checks the
//! type's required properties. A node whose name property held a deferred value is named
//! by what that property resolved to. [`ReferenceResolver::produce`] then asks the node's
//! attribute producer for the attributes it exposes. The resolver never writes to the
//! cache itself: the synthesizer checks names and commits the attributes once a whole
//! topological level is done.

use std::collections::{BTreeMap, BTreeSet};

use super::attributes::ResolvedAttributes;
use super::producers::{ProducerInput, ProducerRegistry};
use crate::config::EnvironmentContext;
use crate::core::{ResourceType, SynthError};
use crate::stack::{Literal, ResourceNode, Value};

/// A node after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    /// Logical id
    pub id: String,
    /// Resource kind
    pub resource_type: ResourceType,
    /// Physical name, assigned up front or taken from the resolved name property
    pub physical_name: String,
    /// Fully literal properties
    pub properties: BTreeMap<String, Literal>,
    /// Merged tags
    pub tags: BTreeMap<String, String>,
    /// Inferred and explicit dependencies
    pub depends_on: BTreeSet<String>,
    /// Attributes this node exposes, empty until [`ReferenceResolver::produce`] ran
    pub attributes: BTreeMap<String, Literal>,
}

/// Resolves values against already computed attributes.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    registry: &'a ProducerRegistry,
    context: &'a EnvironmentContext,
}

impl<'a> ReferenceResolver<'a> {
    /// Resolver producing attributes with `registry` for `context`.
    #[must_use]
    pub const fn new(registry: &'a ProducerRegistry, context: &'a EnvironmentContext) -> Self {
        Self {
            registry,
            context,
        }
    }

    /// Resolve one value to a literal.
    ///
    /// `owner` and `property` only label errors.
    ///
    /// # Errors
    ///
    /// - [`SynthError::UnresolvedReference`] if a referenced attribute is not cached yet
    /// - [`SynthError::InvalidPropertyValue`] if a join part is a list or map
    pub fn resolve_value(
        &self,
        owner: &str,
        property: &str,
        value: &Value,
        resolved: &ResolvedAttributes,
    ) -> Result<Literal, SynthError> {
        match value {
            Value::Literal(literal) => Ok(literal.clone()),
            Value::Reference(reference) => {
                resolved.lookup(reference).cloned().ok_or_else(|| SynthError::UnresolvedReference {
                    node_id: owner.to_string(),
                    target: reference.target.clone(),
                    attribute: reference.attribute.clone(),
                })
            }
            Value::List(items) => items
                .iter()
                .map(|item| self.resolve_value(owner, property, item, resolved))
                .collect::<Result<Vec<_>, _>>()
                .map(Literal::List),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    Ok((key.clone(), self.resolve_value(owner, property, item, resolved)?))
                })
                .collect::<Result<BTreeMap<_, _>, SynthError>>()
                .map(Literal::Map),
            Value::Join { separator, parts } => {
                let mut texts = Vec::with_capacity(parts.len());
                for part in parts {
                    let literal = self.resolve_value(owner, property, part, resolved)?;
                    let text = literal.join_text().ok_or_else(|| SynthError::InvalidPropertyValue {
                        node_id: owner.to_string(),
                        property: property.to_string(),
                        reason: "a joined part resolved to a list or map".to_string(),
                    })?;
                    texts.push(text);
                }
                Ok(Literal::String(texts.join(separator)))
            }
        }
    }

    /// Resolve the properties of a node whose dependencies are all in `resolved`.
    ///
    /// `physical_name` is the name assigned before resolution. Pass `None` for a node
    /// whose name property is deferred; the resolved property becomes its name.
    ///
    /// # Errors
    ///
    /// - anything [`resolve_value`](Self::resolve_value) reports for a property
    /// - [`SynthError::MissingRequiredProperty`] if a required property is absent or null
    /// - [`SynthError::InvalidPropertyValue`] if a deferred name resolves to nothing usable
    pub fn resolve(
        &self,
        node: &ResourceNode,
        physical_name: Option<&str>,
        resolved: &ResolvedAttributes,
    ) -> Result<ResolvedNode, SynthError> {
        let properties = node
            .properties()
            .iter()
            .map(|(name, value)| {
                Ok((name.clone(), self.resolve_value(node.id(), name, value, resolved)?))
            })
            .collect::<Result<BTreeMap<_, _>, SynthError>>()?;

        for &required in node.resource_type().schema().required {
            if matches!(properties.get(required), None | Some(Literal::Null)) {
                return Err(SynthError::MissingRequiredProperty {
                    node_id: node.id().to_string(),
                    property: required.to_string(),
                });
            }
        }

        let physical_name = match physical_name {
            Some(name) => name.to_string(),
            None => resolved_name(node, &properties)?,
        };

        tracing::trace!("Resolved '{}' ({} properties)", node.id(), properties.len());

        Ok(ResolvedNode {
            id: node.id().to_string(),
            resource_type: node.resource_type(),
            physical_name,
            properties,
            tags: node.tags().clone(),
            depends_on: node.dependencies().into_iter().map(str::to_string).collect(),
            attributes: BTreeMap::new(),
        })
    }

    /// Fill in the attributes `node` exposes from its literal properties and name.
    pub fn produce(&self, node: &mut ResolvedNode) {
        node.attributes = self.registry.produce(&ProducerInput {
            node_id: &node.id,
            resource_type: node.resource_type,
            physical_name: &node.physical_name,
            properties: &node.properties,
            context: self.context,
        });
        tracing::trace!("Produced {} attributes for '{}'", node.attributes.len(), node.id);
    }
}

/// Name carried by a resolved name property. Scalars are rendered like join parts.
fn resolved_name(
    node: &ResourceNode,
    properties: &BTreeMap<String, Literal>,
) -> Result<String, SynthError> {
    let Some(property) = node.resource_type().schema().name_property else {
        return Ok(node.id().to_string());
    };

    properties
        .get(property)
        .and_then(Literal::join_text)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SynthError::InvalidPropertyValue {
            node_id: node.id().to_string(),
            property: property.to_string(),
            reason: "the name property must resolve to a non-empty string".to_string(),
        })
}
