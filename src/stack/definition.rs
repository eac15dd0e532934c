//! Declarative stack files
//!
//! A [`StackDefinition`] is the file form of a [`Stack`]: the same nodes and outputs,
//! written as YAML or JSON, without the environment context (which the caller supplies
//! when converting it with [`StackDefinition::into_stack`]).
//!
//! ```yaml
//! name: Demo
//! description: Encrypted bucket
//! resources:
//!   key:
//!     type: key
//!     properties:
//!       KeyPolicy: { Version: "2012-10-17", Statement: [] }
//!   bucket:
//!     type: bucket
//!     properties:
//!       KmsMasterKeyId: { "Fn::GetAtt": [key, arn] }
//!     tags:
//!       Tier: storage
//! outputs:
//!   BucketArn:
//!     value: { "Fn::GetAtt": [bucket, arn] }
//!     exportName: demo-bucket-arn
//! ```
//!
//! Resource ids are map keys, so a file cannot declare the same id twice.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{Output, ResourceNode, Stack, Value};
use crate::config::EnvironmentContext;
use crate::core::{ResourceType, SynthError};

/// File form of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackDefinition {
    /// Stack name
    pub name: String,
    /// Template description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources by logical id
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDefinition>,
    /// Outputs by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, OutputDefinition>,
}

/// File form of a [`ResourceNode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDefinition {
    /// Resource kind, kebab-case
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Properties in wire form
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    /// Node-local tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Explicit ordering hints
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
    /// Pinned physical name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_name: Option<String>,
}

/// File form of an [`Output`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputDefinition {
    /// Output value in wire form
    pub value: Value,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Export identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
}

impl StackDefinition {
    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, SynthError> {
        serde_yaml::from_str(content).map_err(|e| SynthError::InvalidDefinition {
            reason: e.to_string(),
        })
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, SynthError> {
        serde_json::from_str(content).map_err(|e| SynthError::InvalidDefinition {
            reason: e.to_string(),
        })
    }

    /// Read a definition file. `.json` files are parsed as JSON, anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stack file: {}", path.display()))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let definition = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };

        definition.with_context(|| format!("Failed to parse stack file: {}", path.display()))
    }

    /// Render as YAML.
    pub fn to_yaml_string(&self) -> Result<String, SynthError> {
        serde_yaml::to_string(self).map_err(|e| SynthError::InvalidDefinition {
            reason: e.to_string(),
        })
    }

    /// Render as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, SynthError> {
        serde_json::to_string_pretty(self).map_err(|e| SynthError::InvalidDefinition {
            reason: e.to_string(),
        })
    }

    /// Compose a [`Stack`] for `context`.
    ///
    /// Nodes are added in ascending id order. References are not checked here; that
    /// happens in [`Stack::validate`] at synthesis.
    pub fn into_stack(self, context: EnvironmentContext) -> Result<Stack, SynthError> {
        let mut stack = Stack::new(self.name, context);
        if let Some(description) = self.description {
            stack = stack.with_description(description);
        }

        for (id, resource) in self.resources {
            let mut node = ResourceNode::new(id, resource.resource_type);
            for (name, value) in resource.properties {
                node.set_property(name, value);
            }
            for (key, value) in resource.tags {
                node.set_tag(key, value);
            }
            for dep in resource.depends_on {
                node.add_dependency(dep);
            }
            if let Some(name) = resource.physical_name {
                node = node.with_physical_name(name);
            }
            stack.add(node)?;
        }

        for (name, output) in self.outputs {
            let mut declared = Output::new(output.value);
            declared.description = output.description;
            declared.export_name = output.export_name;
            stack.add_output(name, declared);
        }

        Ok(stack)
    }

    /// Capture the nodes and outputs of `stack`.
    #[must_use]
    pub fn from_stack(stack: &Stack) -> Self {
        let resources = stack
            .nodes()
            .map(|node| {
                (
                    node.id().to_string(),
                    ResourceDefinition {
                        resource_type: node.resource_type(),
                        properties: node.properties().clone(),
                        tags: node.tags().clone(),
                        depends_on: node.explicit_dependencies().clone(),
                        physical_name: node.physical_name().map(str::to_string),
                    },
                )
            })
            .collect();

        let outputs = stack
            .outputs()
            .iter()
            .map(|(name, output)| {
                (
                    name.clone(),
                    OutputDefinition {
                        value: output.value.clone(),
                        description: output.description.clone(),
                        export_name: output.export_name.clone(),
                    },
                )
            })
            .collect();

        Self {
            name: stack.name().to_string(),
            description: stack.description().map(str::to_string),
            resources,
            outputs,
        }
    }
}
