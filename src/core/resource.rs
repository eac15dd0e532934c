//! Resource kinds and their schemas
//!
//! Every [`ResourceNode`](crate::stack::ResourceNode) carries a [`ResourceType`]. The type
//! decides three things about the node:
//!
//! - which attributes other nodes may reference (`arn`, `id`, `name`, ...)
//! - which properties must be present once the node is resolved
//! - how the node's physical name is shaped and where it is written
//!
//! All of that lives in a static [`ResourceSchema`] returned by [`ResourceType::schema`],
//! so adding a kind means adding a variant and a schema entry; nothing in the graph,
//! resolver or synthesizer changes.
//!
//! # Examples
//!
//! ```rust
//! use stacksynth::core::ResourceType;
//!
//! let bucket: ResourceType = "bucket".parse().unwrap();
//! assert_eq!(bucket.schema().template_type, "AWS::S3::Bucket");
//! assert!(bucket.exposes("arn"));
//! assert!(!bucket.exposes("id"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SynthError;

/// Enumeration of the resource kinds the synthesizer understands.
///
/// Serialized in kebab-case (`"security-group"`, `"auto-scaling-group"`), which is also
/// the form accepted by [`FromStr`] and produced by [`Display`](fmt::Display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    /// Customer-managed KMS key
    Key,
    /// Alias pointing at a KMS key
    KeyAlias,
    /// Virtual private cloud
    Vpc,
    /// VPC flow log
    FlowLog,
    /// EC2 security group
    SecurityGroup,
    /// S3 bucket
    Bucket,
    /// S3 bucket policy
    BucketPolicy,
    /// Secrets Manager secret
    Secret,
    /// SSM string parameter
    Parameter,
    /// SNS topic
    Topic,
    /// IAM role
    Role,
    /// CloudWatch log group
    LogGroup,
    /// Lambda function
    Function,
    /// EC2 launch template
    LaunchTemplate,
    /// Auto scaling group
    AutoScalingGroup,
    /// EC2 instance
    Instance,
    /// CloudFront origin access identity
    OriginAccessIdentity,
    /// CloudFront distribution
    Distribution,
    /// WAFv2 web ACL
    WebAcl,
    /// CloudTrail trail
    Trail,
    /// CloudWatch alarm
    Alarm,
}

/// Static description of a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Type string written to the output document (`AWS::S3::Bucket`).
    pub template_type: &'static str,
    /// Attributes the kind exposes to references, in declaration order.
    pub attributes: &'static [&'static str],
    /// Properties that must be present after resolution.
    pub required: &'static [&'static str],
    /// Property that receives the physical name, if the kind has one.
    pub name_property: Option<&'static str>,
    /// Longest physical name the provider accepts for this kind.
    pub max_name_length: usize,
    /// Whether names share one namespace across accounts (S3 buckets).
    pub global_namespace: bool,
}

impl ResourceType {
    /// Every resource kind, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::Key,
        Self::KeyAlias,
        Self::Vpc,
        Self::FlowLog,
        Self::SecurityGroup,
        Self::Bucket,
        Self::BucketPolicy,
        Self::Secret,
        Self::Parameter,
        Self::Topic,
        Self::Role,
        Self::LogGroup,
        Self::Function,
        Self::LaunchTemplate,
        Self::AutoScalingGroup,
        Self::Instance,
        Self::OriginAccessIdentity,
        Self::Distribution,
        Self::WebAcl,
        Self::Trail,
        Self::Alarm,
    ];

    /// Kebab-case name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::KeyAlias => "key-alias",
            Self::Vpc => "vpc",
            Self::FlowLog => "flow-log",
            Self::SecurityGroup => "security-group",
            Self::Bucket => "bucket",
            Self::BucketPolicy => "bucket-policy",
            Self::Secret => "secret",
            Self::Parameter => "parameter",
            Self::Topic => "topic",
            Self::Role => "role",
            Self::LogGroup => "log-group",
            Self::Function => "function",
            Self::LaunchTemplate => "launch-template",
            Self::AutoScalingGroup => "auto-scaling-group",
            Self::Instance => "instance",
            Self::OriginAccessIdentity => "origin-access-identity",
            Self::Distribution => "distribution",
            Self::WebAcl => "web-acl",
            Self::Trail => "trail",
            Self::Alarm => "alarm",
        }
    }

    /// Schema for this kind.
    #[must_use]
    pub const fn schema(&self) -> ResourceSchema {
        match self {
            Self::Key => ResourceSchema {
                template_type: "AWS::KMS::Key",
                attributes: &["arn", "id"],
                required: &["KeyPolicy"],
                name_property: None,
                max_name_length: 256,
                global_namespace: false,
            },
            Self::KeyAlias => ResourceSchema {
                template_type: "AWS::KMS::Alias",
                attributes: &["arn", "name"],
                required: &["TargetKeyId"],
                name_property: Some("AliasName"),
                max_name_length: 256,
                global_namespace: false,
            },
            Self::Vpc => ResourceSchema {
                template_type: "AWS::EC2::VPC",
                attributes: &["id", "cidrBlock"],
                required: &["CidrBlock"],
                name_property: None,
                max_name_length: 255,
                global_namespace: false,
            },
            Self::FlowLog => ResourceSchema {
                template_type: "AWS::EC2::FlowLog",
                attributes: &["id"],
                required: &["ResourceId", "ResourceType", "LogDestination"],
                name_property: None,
                max_name_length: 255,
                global_namespace: false,
            },
            Self::SecurityGroup => ResourceSchema {
                template_type: "AWS::EC2::SecurityGroup",
                attributes: &["id", "name"],
                required: &["GroupDescription", "VpcId"],
                name_property: Some("GroupName"),
                max_name_length: 255,
                global_namespace: false,
            },
            Self::Bucket => ResourceSchema {
                template_type: "AWS::S3::Bucket",
                attributes: &["arn", "name", "domainName", "regionalDomainName"],
                required: &[],
                name_property: Some("BucketName"),
                max_name_length: 63,
                global_namespace: true,
            },
            Self::BucketPolicy => ResourceSchema {
                template_type: "AWS::S3::BucketPolicy",
                attributes: &[],
                required: &["Bucket", "PolicyDocument"],
                name_property: None,
                max_name_length: 255,
                global_namespace: false,
            },
            Self::Secret => ResourceSchema {
                template_type: "AWS::SecretsManager::Secret",
                attributes: &["arn", "name"],
                required: &[],
                name_property: Some("Name"),
                max_name_length: 512,
                global_namespace: false,
            },
            Self::Parameter => ResourceSchema {
                template_type: "AWS::SSM::Parameter",
                attributes: &["arn", "name"],
                required: &["Type", "Value"],
                name_property: Some("Name"),
                max_name_length: 2048,
                global_namespace: false,
            },
            Self::Topic => ResourceSchema {
                template_type: "AWS::SNS::Topic",
                attributes: &["arn", "name"],
                required: &[],
                name_property: Some("TopicName"),
                max_name_length: 256,
                global_namespace: false,
            },
            Self::Role => ResourceSchema {
                template_type: "AWS::IAM::Role",
                attributes: &["arn", "name", "roleId"],
                required: &["AssumeRolePolicyDocument"],
                name_property: Some("RoleName"),
                max_name_length: 64,
                global_namespace: false,
            },
            Self::LogGroup => ResourceSchema {
                template_type: "AWS::Logs::LogGroup",
                attributes: &["arn", "name"],
                required: &[],
                name_property: Some("LogGroupName"),
                max_name_length: 512,
                global_namespace: false,
            },
            Self::Function => ResourceSchema {
                template_type: "AWS::Lambda::Function",
                attributes: &["arn", "name"],
                required: &["Code", "Handler", "Role", "Runtime"],
                name_property: Some("FunctionName"),
                max_name_length: 64,
                global_namespace: false,
            },
            Self::LaunchTemplate => ResourceSchema {
                template_type: "AWS::EC2::LaunchTemplate",
                attributes: &["id", "name", "latestVersionNumber"],
                required: &["LaunchTemplateData"],
                name_property: Some("LaunchTemplateName"),
                max_name_length: 128,
                global_namespace: false,
            },
            Self::AutoScalingGroup => ResourceSchema {
                template_type: "AWS::AutoScaling::AutoScalingGroup",
                attributes: &["arn", "name"],
                required: &["MaxSize", "MinSize"],
                name_property: Some("AutoScalingGroupName"),
                max_name_length: 255,
                global_namespace: false,
            },
            Self::Instance => ResourceSchema {
                template_type: "AWS::EC2::Instance",
                attributes: &["id", "privateIp"],
                required: &["ImageId", "InstanceType"],
                name_property: None,
                max_name_length: 255,
                global_namespace: false,
            },
            Self::OriginAccessIdentity => ResourceSchema {
                template_type: "AWS::CloudFront::CloudFrontOriginAccessIdentity",
                attributes: &["id", "s3CanonicalUserId"],
                required: &["CloudFrontOriginAccessIdentityConfig"],
                name_property: None,
                max_name_length: 128,
                global_namespace: false,
            },
            Self::Distribution => ResourceSchema {
                template_type: "AWS::CloudFront::Distribution",
                attributes: &["id", "domainName"],
                required: &["DistributionConfig"],
                name_property: None,
                max_name_length: 128,
                global_namespace: false,
            },
            Self::WebAcl => ResourceSchema {
                template_type: "AWS::WAFv2::WebACL",
                attributes: &["arn", "id"],
                required: &["DefaultAction", "Scope", "VisibilityConfig"],
                name_property: Some("Name"),
                max_name_length: 128,
                global_namespace: false,
            },
            Self::Trail => ResourceSchema {
                template_type: "AWS::CloudTrail::Trail",
                attributes: &["arn"],
                required: &["IsLogging", "S3BucketName"],
                name_property: Some("TrailName"),
                max_name_length: 128,
                global_namespace: false,
            },
            Self::Alarm => ResourceSchema {
                template_type: "AWS::CloudWatch::Alarm",
                attributes: &["arn"],
                required: &["ComparisonOperator", "EvaluationPeriods"],
                name_property: Some("AlarmName"),
                max_name_length: 255,
                global_namespace: false,
            },
        }
    }

    /// Whether this kind exposes `attribute` to references.
    #[must_use]
    pub fn exposes(&self, attribute: &str) -> bool {
        self.schema().attributes.contains(&attribute)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL.iter().copied().find(|kind| kind.as_str() == normalized).ok_or_else(|| {
            SynthError::InvalidResourceType {
                resource_type: s.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_str() {
        for kind in ResourceType::ALL {
            let parsed: ResourceType = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_parse_accepts_underscores_and_case() {
        assert_eq!("Security_Group".parse::<ResourceType>().unwrap(), ResourceType::SecurityGroup);
        assert!("queue".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ResourceType::AutoScalingGroup).unwrap();
        assert_eq!(json, "\"auto-scaling-group\"");
        let back: ResourceType = serde_json::from_str("\"web-acl\"").unwrap();
        assert_eq!(back, ResourceType::WebAcl);
    }

    #[test]
    fn test_bucket_and_key_attributes() {
        assert!(ResourceType::Bucket.exposes("arn"));
        assert!(ResourceType::Bucket.exposes("name"));
        assert!(ResourceType::Key.exposes("arn"));
        assert!(ResourceType::Key.exposes("id"));
        assert!(!ResourceType::BucketPolicy.exposes("arn"));
    }

    #[test]
    fn test_name_properties_are_not_required() {
        // The physical name is injected, so a schema never has to demand it.
        for kind in ResourceType::ALL {
            let schema = kind.schema();
            if let Some(prop) = schema.name_property {
                assert!(!schema.required.contains(&prop), "{kind} requires its name property");
            }
        }
    }
}
