//! Attribute producers.
//!
//! Once a node's properties are fully literal, its type-specific producer computes the
//! attributes other nodes may reference: ARNs, ids, names, endpoints. Producers are pure
//! functions of [`ProducerInput`]; the same input always yields the same attributes.
//!
//! ARNs use the `aws` partition. Without a pinned account or region they carry the
//! `${AWS::AccountId}` / `${AWS::Region}` placeholders. Opaque identifiers (`vpc-…`,
//! `sg-…`, key ids) are cut from a SHA-256 digest of the node's type, logical id and
//! physical name, so they never change between runs.
//!
//! New resource kinds plug in through [`ProducerRegistry::register`]; the resolver only
//! ever dispatches on [`ResourceType`].

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::EnvironmentContext;
use crate::config::context::PARTITION;
use crate::core::ResourceType;
use crate::stack::Literal;

/// Everything a producer may look at.
#[derive(Debug, Clone, Copy)]
pub struct ProducerInput<'a> {
    /// Logical id
    pub node_id: &'a str,
    /// Resource kind
    pub resource_type: ResourceType,
    /// Physical name assigned by the naming convention
    pub physical_name: &'a str,
    /// Fully resolved properties
    pub properties: &'a BTreeMap<String, Literal>,
    /// Target environment
    pub context: &'a EnvironmentContext,
}

impl ProducerInput<'_> {
    /// String property, if present and a string.
    #[must_use]
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Literal::as_str)
    }

    /// Hex SHA-256 digest of type, logical id and physical name.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.resource_type.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(self.node_id.as_bytes());
        hasher.update([0]);
        hasher.update(self.physical_name.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// `arn:aws:{service}:{region}:{account}:{resource}`
    #[must_use]
    pub fn regional_arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:{PARTITION}:{service}:{}:{}:{resource}",
            self.context.region_or_placeholder(),
            self.context.account_or_placeholder()
        )
    }

    /// `arn:aws:{service}::{account}:{resource}`
    #[must_use]
    pub fn global_arn(&self, service: &str, resource: &str) -> String {
        format!("arn:{PARTITION}:{service}::{}:{resource}", self.context.account_or_placeholder())
    }

    /// Prefixed 17-hex-digit id, the shape EC2 uses.
    #[must_use]
    pub fn ec2_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", &self.digest()[..17])
    }

    /// UUID-shaped id.
    #[must_use]
    pub fn uuid(&self) -> String {
        let d = self.digest();
        format!("{}-{}-{}-{}-{}", &d[..8], &d[8..12], &d[12..16], &d[16..20], &d[20..32])
    }
}

/// Computes a resource kind's exposed attributes from its resolved state.
pub trait AttributeProducer: Send + Sync {
    /// Attribute name → value. Must cover every attribute the kind's schema exposes.
    fn produce(&self, input: &ProducerInput<'_>) -> BTreeMap<String, Literal>;
}

impl<F> AttributeProducer for F
where
    F: Fn(&ProducerInput<'_>) -> BTreeMap<String, Literal> + Send + Sync,
{
    fn produce(&self, input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
        self(input)
    }
}

/// Producer lookup by resource kind.
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    producers: HashMap<ResourceType, Arc<dyn AttributeProducer>>,
}

impl std::fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.producers.keys().map(ResourceType::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ProducerRegistry").field("kinds", &kinds).finish()
    }
}

impl ProducerRegistry {
    /// Registry with no producers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with a producer for every built-in kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in ResourceType::ALL {
            registry.register(kind, default_producer(kind));
        }
        registry
    }

    /// Install `producer` for `kind`, replacing any earlier one.
    pub fn register(&mut self, kind: ResourceType, producer: impl AttributeProducer + 'static) {
        self.producers.insert(kind, Arc::new(producer));
    }

    /// Producer for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: ResourceType) -> Option<&dyn AttributeProducer> {
        self.producers.get(&kind).map(|producer| &**producer)
    }

    /// Run the producer for the input's kind. A kind without a producer exposes nothing.
    #[must_use]
    pub fn produce(&self, input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
        match self.get(input.resource_type) {
            Some(producer) => producer.produce(input),
            None => {
                tracing::warn!(
                    "No attribute producer registered for '{}' ({})",
                    input.node_id,
                    input.resource_type
                );
                BTreeMap::new()
            }
        }
    }
}

type ProducerFn = fn(&ProducerInput<'_>) -> BTreeMap<String, Literal>;

fn default_producer(kind: ResourceType) -> ProducerFn {
    match kind {
        ResourceType::Key => key,
        ResourceType::KeyAlias => key_alias,
        ResourceType::Vpc => vpc,
        ResourceType::FlowLog => flow_log,
        ResourceType::SecurityGroup => security_group,
        ResourceType::Bucket => bucket,
        ResourceType::BucketPolicy => bucket_policy,
        ResourceType::Secret => secret,
        ResourceType::Parameter => parameter,
        ResourceType::Topic => topic,
        ResourceType::Role => role,
        ResourceType::LogGroup => log_group,
        ResourceType::Function => function,
        ResourceType::LaunchTemplate => launch_template,
        ResourceType::AutoScalingGroup => auto_scaling_group,
        ResourceType::Instance => instance,
        ResourceType::OriginAccessIdentity => origin_access_identity,
        ResourceType::Distribution => distribution,
        ResourceType::WebAcl => web_acl,
        ResourceType::Trail => trail,
        ResourceType::Alarm => alarm,
    }
}

fn attrs<const N: usize>(entries: [(&str, String); N]) -> BTreeMap<String, Literal> {
    entries.into_iter().map(|(k, v)| (k.to_string(), Literal::String(v))).collect()
}

fn key(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let id = input.uuid();
    attrs([("arn", input.regional_arn("kms", &format!("key/{id}"))), ("id", id)])
}

fn key_alias(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name.to_string();
    attrs([("arn", input.regional_arn("kms", &name)), ("name", name)])
}

fn vpc(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let cidr = input.string_property("CidrBlock").unwrap_or_default().to_string();
    attrs([("id", input.ec2_id("vpc")), ("cidrBlock", cidr)])
}

fn flow_log(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    attrs([("id", input.ec2_id("fl"))])
}

fn security_group(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    attrs([("id", input.ec2_id("sg")), ("name", input.physical_name.to_string())])
}

fn bucket(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    attrs([
        ("arn", format!("arn:{PARTITION}:s3:::{name}")),
        ("domainName", format!("{name}.s3.amazonaws.com")),
        ("name", name.to_string()),
        (
            "regionalDomainName",
            format!("{name}.s3.{}.amazonaws.com", input.context.region_or_placeholder()),
        ),
    ])
}

fn bucket_policy(_input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    BTreeMap::new()
}

fn secret(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    let tag = &input.digest()[..6];
    attrs([
        ("arn", input.regional_arn("secretsmanager", &format!("secret:{name}-{tag}"))),
        ("name", name.to_string()),
    ])
}

fn parameter(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    let path = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    };
    attrs([
        ("arn", input.regional_arn("ssm", &format!("parameter{path}"))),
        ("name", name.to_string()),
    ])
}

fn topic(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    attrs([("arn", input.regional_arn("sns", name)), ("name", name.to_string())])
}

fn role(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    attrs([
        ("arn", input.global_arn("iam", &format!("role/{name}"))),
        ("name", name.to_string()),
        ("roleId", format!("AROA{}", input.digest()[..17].to_uppercase())),
    ])
}

fn log_group(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    attrs([
        ("arn", input.regional_arn("logs", &format!("log-group:{name}"))),
        ("name", name.to_string()),
    ])
}

fn function(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    attrs([
        ("arn", input.regional_arn("lambda", &format!("function:{name}"))),
        ("name", name.to_string()),
    ])
}

fn launch_template(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    attrs([
        ("id", input.ec2_id("lt")),
        ("latestVersionNumber", "1".to_string()),
        ("name", input.physical_name.to_string()),
    ])
}

fn auto_scaling_group(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let name = input.physical_name;
    let resource = format!("autoScalingGroup:{}:autoScalingGroupName/{name}", input.uuid());
    attrs([("arn", input.regional_arn("autoscaling", &resource)), ("name", name.to_string())])
}

/// Host octets a subnet hands out; the first four and the broadcast address are reserved.
const HOST_OCTETS: std::ops::RangeInclusive<u8> = 4..=254;

fn instance(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let digest = input.digest();
    let octet = |i: usize| u8::from_str_radix(&digest[i..i + 2], 16).unwrap_or_default();
    let host = octet(2).clamp(*HOST_OCTETS.start(), *HOST_OCTETS.end());
    attrs([("id", input.ec2_id("i")), ("privateIp", format!("10.0.{}.{host}", octet(0)))])
}

fn origin_access_identity(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let digest = input.digest();
    attrs([("id", format!("E{}", digest[..13].to_uppercase())), ("s3CanonicalUserId", digest)])
}

fn distribution(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let digest = input.digest();
    attrs([
        ("domainName", format!("d{}.cloudfront.net", &digest[..13])),
        ("id", format!("E{}", digest[13..26].to_uppercase())),
    ])
}

fn web_acl(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    let scope = match input.string_property("Scope") {
        Some("CLOUDFRONT") => "global",
        _ => "regional",
    };
    let id = input.uuid();
    let resource = format!("{scope}/webacl/{}/{id}", input.physical_name);
    attrs([("arn", input.regional_arn("wafv2", &resource)), ("id", id)])
}

fn trail(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    attrs([("arn", input.regional_arn("cloudtrail", &format!("trail/{}", input.physical_name)))])
}

fn alarm(input: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
    attrs([("arn", input.regional_arn("cloudwatch", &format!("alarm:{}", input.physical_name)))])
}
