//! The synthesized document.
//!
//! [`Template`] is the only thing synthesis hands to the outside world. Every map in it
//! is a `BTreeMap`, so resources, properties, tags and outputs always serialize in
//! ascending key order and two syntheses of the same stack render byte for byte alike.
//!
//! ```json
//! {
//!   "AWSTemplateFormatVersion": "2010-09-09",
//!   "Resources": {
//!     "bucket": {
//!       "Type": "AWS::S3::Bucket",
//!       "PhysicalName": "prod-dev-bucket",
//!       "Properties": { "BucketName": "prod-dev-bucket", "KmsMasterKeyId": "arn:aws:kms:..." },
//!       "DependsOn": ["key"]
//!     }
//!   },
//!   "Outputs": {
//!     "BucketArn": { "Value": "arn:aws:s3:::prod-dev-bucket", "Export": { "Name": "bucket-arn" } }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resolver::ResolvedNode;
use crate::stack::Literal;

/// Format version written into every template.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Serialization format of a [`Template`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TemplateFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// A synthesized deployment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Always [`FORMAT_VERSION`]
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Stack description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources by logical id
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, TemplateResource>,
    /// Outputs by name
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

/// One resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    /// Provider type string
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Assigned physical name
    pub physical_name: String,
    /// Fully literal properties
    #[serde(default)]
    pub properties: BTreeMap<String, Literal>,
    /// Merged tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Inferred and explicit dependencies, ascending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// One resolved output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    /// Resolved value
    pub value: Literal,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Cross-stack export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

/// Export block of an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    /// Export identifier
    pub name: String,
}

impl From<ResolvedNode> for TemplateResource {
    fn from(node: ResolvedNode) -> Self {
        Self {
            resource_type: node.resource_type.schema().template_type.to_string(),
            physical_name: node.physical_name,
            properties: node.properties,
            tags: node.tags,
            depends_on: node.depends_on.into_iter().collect(),
        }
    }
}

impl Template {
    /// Empty template.
    #[must_use]
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to render template as JSON")?;
        json.push('\n');
        Ok(json)
    }

    /// YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render template as YAML")
    }

    /// Render in `format`.
    pub fn render(&self, format: TemplateFormat) -> Result<String> {
        match format {
            TemplateFormat::Json => self.to_json_pretty(),
            TemplateFormat::Yaml => self.to_yaml(),
        }
    }

    /// Output value by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Literal> {
        self.outputs.get(name).map(|output| &output.value)
    }

    /// Resource by logical id.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&TemplateResource> {
        self.resources.get(id)
    }
}
