//! Physical names.
//!
//! A physical name is a pure function of the node's type and logical id plus the
//! context's suffix and account:
//!
//! | Kind        | Shape                                   |
//! |-------------|-----------------------------------------|
//! | `parameter` | `/{prefix}-{suffix}/{slug}`             |
//! | `key-alias` | `alias/{prefix}-{suffix}-{slug}`        |
//! | `bucket`    | `{prefix}-{suffix}-{slug}[-{account}]`  |
//! | other       | `{prefix}-{suffix}-{slug}`              |
//!
//! `slug` is the kebab-case form of the logical id (`ProdS3Bucket` → `prod-s3-bucket`).
//! Names longer than the kind allows are cut and end in eight hex digits of the full
//! name's SHA-256, so two long names that share a prefix still differ.
//!
//! A node can opt out of derivation with an explicit physical name, or by setting its
//! kind's name property to a plain string; either is used verbatim. A name property that
//! holds a reference or join is named by its resolved value, so those nodes join the
//! [`NameTable`] only once their level has been resolved.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::config::EnvironmentContext;
use crate::config::settings::DEFAULT_PREFIX;
use crate::core::{ResourceType, SynthError};
use crate::stack::{Literal, ResourceNode, Stack, Value};

static INVALID_BUCKET_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("static regex"));
static REPEATED_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex"));

/// Hex digits appended to truncated names.
const HASH_SUFFIX_LEN: usize = 8;

/// Physical names by node id, plus the nodes claiming each name of a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    by_node: BTreeMap<String, String>,
    claims: BTreeMap<(ResourceType, String), BTreeSet<String>>,
}

impl NameTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as the physical name of `node_id`.
    pub fn claim(&mut self, resource_type: ResourceType, node_id: &str, name: &str) {
        self.by_node.insert(node_id.to_string(), name.to_string());
        self.claims
            .entry((resource_type, name.to_string()))
            .or_default()
            .insert(node_id.to_string());
    }

    /// Physical name of `node_id`, if it has one yet.
    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<&str> {
        self.by_node.get(node_id).map(String::as_str)
    }

    /// Number of named nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    /// Whether no node is named yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    /// Fail on the first name two nodes of one kind share.
    ///
    /// # Errors
    ///
    /// [`SynthError::NameCollision`] for the lowest colliding (kind, name), node ids
    /// ascending.
    pub fn check_unique(&self) -> Result<(), SynthError> {
        match self.claims.iter().find(|(_, ids)| ids.len() > 1) {
            Some(((_, name), ids)) => Err(SynthError::NameCollision {
                name: name.clone(),
                node_ids: ids.iter().cloned().collect(),
            }),
            None => Ok(()),
        }
    }

    /// Physical name of every named node by id.
    #[must_use]
    pub fn into_names(self) -> BTreeMap<String, String> {
        self.by_node
    }
}

/// Derives deterministic physical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    prefix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl NamingConvention {
    /// Convention with `prefix` as the leading name segment.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Leading name segment.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Kebab-case form of a logical id.
    ///
    /// ```rust
    /// use stacksynth::synth::NamingConvention;
    ///
    /// assert_eq!(NamingConvention::slug("ProdS3Bucket"), "prod-s3-bucket");
    /// assert_eq!(NamingConvention::slug("VPCFlowLogsBucket"), "vpc-flow-logs-bucket");
    /// assert_eq!(NamingConvention::slug("EC2SG"), "ec2-sg");
    /// ```
    #[must_use]
    pub fn slug(id: &str) -> String {
        let chars: Vec<char> = id.chars().collect();
        let mut slug = String::with_capacity(id.len() + 4);

        for (i, &c) in chars.iter().enumerate() {
            if c.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
                if prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower)
                {
                    slug.push('-');
                }
            }
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else {
                slug.push('-');
            }
        }

        REPEATED_DASHES.replace_all(&slug, "-").trim_matches('-').to_string()
    }

    /// Name derived from the node's type and id, ignoring any override.
    #[must_use]
    pub fn derive(
        &self,
        resource_type: ResourceType,
        id: &str,
        context: &EnvironmentContext,
    ) -> String {
        let stem = format!("{}-{}", self.prefix, context.suffix());
        let slug = Self::slug(id);

        let name = match resource_type {
            ResourceType::Parameter => format!("/{stem}/{slug}"),
            ResourceType::KeyAlias => format!("alias/{stem}-{slug}"),
            ResourceType::Bucket => {
                let raw = match context.account() {
                    Some(account) => format!("{stem}-{slug}-{account}"),
                    None => format!("{stem}-{slug}"),
                };
                let lowered = raw.to_lowercase();
                let cleaned = INVALID_BUCKET_CHARS.replace_all(&lowered, "-");
                REPEATED_DASHES.replace_all(&cleaned, "-").trim_matches('-').to_string()
            }
            _ => format!("{stem}-{slug}"),
        };

        fit_length(&name, resource_type.schema().max_name_length)
    }

    /// Physical name of `node` as far as it is known before resolution: explicit
    /// override, then a plain-string name property, then the derived name.
    ///
    /// `None` when the name property holds any other value; the node is named by that
    /// value once it resolves.
    #[must_use]
    pub fn physical_name(
        &self,
        node: &ResourceNode,
        context: &EnvironmentContext,
    ) -> Option<String> {
        if let Some(name) = node.physical_name() {
            return Some(name.to_string());
        }

        let property = node.resource_type().schema().name_property.and_then(|p| node.property(p));
        match property {
            None => Some(self.derive(node.resource_type(), node.id(), context)),
            Some(Value::Literal(Literal::String(name))) => Some(name.clone()),
            Some(_) => None,
        }
    }

    /// Name every node of `stack` whose name is known up front, check uniqueness, and
    /// write each name into its kind's name property when the node left that property
    /// unset.
    ///
    /// Nodes with a deferred name property are left out of the returned table; the
    /// synthesizer claims their names level by level.
    ///
    /// # Errors
    ///
    /// [`SynthError::NameCollision`] if two nodes of one kind end up with the same name.
    /// Collisions are reported in ascending (kind, name) order with the node ids sorted.
    pub fn apply(&self, stack: &mut Stack) -> Result<NameTable, SynthError> {
        let mut table = NameTable::new();
        for node in stack.nodes() {
            if let Some(name) = self.physical_name(node, stack.context()) {
                table.claim(node.resource_type(), node.id(), &name);
            }
        }
        table.check_unique()?;

        for node in stack.nodes_mut() {
            let Some(prop) = node.resource_type().schema().name_property else {
                continue;
            };
            if node.property(prop).is_none() {
                if let Some(name) = table.get(node.id()) {
                    node.set_property(prop, name);
                }
            }
        }

        tracing::debug!(
            "Assigned {} physical names, {} deferred until resolution",
            table.len(),
            stack.len() - table.len()
        );
        Ok(table)
    }
}

/// Cut `name` to at most `max` bytes, ending in a short hash of the full name.
///
/// The cut lands on a char boundary, so a multi-byte char is dropped whole.
fn fit_length(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let mut end = max.saturating_sub(HASH_SUFFIX_LEN + 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let head = name[..end].trim_end_matches('-');
    format!("{head}-{}", &digest[..HASH_SUFFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Reference;

    fn context() -> EnvironmentContext {
        EnvironmentContext::new("pr7")
    }

    #[test]
    fn test_slug() {
        assert_eq!(NamingConvention::slug("ProdKMSKey"), "prod-kms-key");
        assert_eq!(NamingConvention::slug("LambdaSG"), "lambda-sg");
        assert_eq!(NamingConvention::slug("bucket"), "bucket");
        assert_eq!(NamingConvention::slug("my_bucket--2"), "my-bucket-2");
        assert_eq!(NamingConvention::slug("SSMParamlog-level"), "ssm-paramlog-level");
    }

    #[test]
    fn test_shapes_per_kind() {
        let naming = NamingConvention::default();
        let ctx = context();
        assert_eq!(naming.derive(ResourceType::Topic, "Alerts", &ctx), "prod-pr7-alerts");
        assert_eq!(naming.derive(ResourceType::Parameter, "LogLevel", &ctx), "/prod-pr7/log-level");
        assert_eq!(naming.derive(ResourceType::KeyAlias, "KeyAlias", &ctx), "alias/prod-pr7-key-alias");
        assert_eq!(naming.derive(ResourceType::Bucket, "Data", &ctx), "prod-pr7-data");

        let pinned = context().with_environment("123456789012", "us-east-1");
        assert_eq!(naming.derive(ResourceType::Bucket, "Data", &pinned), "prod-pr7-data-123456789012");
    }

    #[test]
    fn test_bucket_names_are_lowercase_and_clean() {
        let naming = NamingConvention::new("Acme");
        let ctx = EnvironmentContext::new("Feature_X");
        assert_eq!(naming.derive(ResourceType::Bucket, "Logs", &ctx), "acme-feature-x-logs");
    }

    #[test]
    fn test_long_names_are_truncated_with_hash() {
        let naming = NamingConvention::default();
        let ctx = context();
        let id = "AnExtremelyLongLogicalIdentifierForARoleThatGoesOnAndOn";
        let a = naming.derive(ResourceType::Role, id, &ctx);
        let b = naming.derive(ResourceType::Role, &format!("{id}Again"), &ctx);

        assert!(a.len() <= 64, "{a}");
        assert!(b.len() <= 64, "{b}");
        assert_ne!(a, b);
        assert_eq!(a, naming.derive(ResourceType::Role, id, &ctx));
    }

    #[test]
    fn test_truncation_counts_bytes_for_multibyte_suffix() {
        let naming = NamingConvention::default();
        let ctx = EnvironmentContext::new("übersetzung-größenprüfung-ärger-öl");
        let max = ResourceType::Role.schema().max_name_length;
        let id = "AnExtremelyLongLogicalIdentifierForARole";
        let name = naming.derive(ResourceType::Role, id, &ctx);

        assert!(name.len() <= max, "{name} is {} bytes", name.len());
        assert!(name.starts_with("prod-über"));
        assert_eq!(name, naming.derive(ResourceType::Role, id, &ctx));
    }

    #[test]
    fn test_cut_never_splits_a_char() {
        // 'é' spans bytes 2..4; a 3-byte head would end inside it
        let cut = fit_length("abé-and-more-text", 12);
        assert!(cut.starts_with("ab-"), "{cut}");
        assert_eq!(cut.len(), 2 + 1 + HASH_SUFFIX_LEN);
    }

    #[test]
    fn test_overrides_are_used_verbatim() {
        let naming = NamingConvention::default();
        let ctx = context();

        let explicit = ResourceNode::new("Data", ResourceType::Bucket).with_physical_name("My-Name");
        assert_eq!(naming.physical_name(&explicit, &ctx).as_deref(), Some("My-Name"));

        let by_property =
            ResourceNode::new("Data", ResourceType::Bucket).with_property("BucketName", "fixed");
        assert_eq!(naming.physical_name(&by_property, &ctx).as_deref(), Some("fixed"));
    }

    #[test]
    fn test_deferred_name_property_is_not_named_up_front() {
        let mut stack = Stack::new("s", context());
        stack.add(ResourceNode::new("Key", ResourceType::Key)).unwrap();
        stack
            .add(ResourceNode::new("Data", ResourceType::Bucket).with_property(
                "BucketName",
                Value::concat(["data-".into(), Reference::new("Key", "id").into()]),
            ))
            .unwrap();

        let naming = NamingConvention::default();
        assert_eq!(naming.physical_name(stack.node("Data").unwrap(), stack.context()), None);

        let names = naming.apply(&mut stack).unwrap();
        assert_eq!(names.get("Data"), None);
        assert_eq!(names.get("Key"), Some("prod-pr7-key"));
        assert!(matches!(
            stack.node("Data").unwrap().property("BucketName"),
            Some(Value::Join { .. })
        ));
    }

    #[test]
    fn test_table_reports_lowest_collision() {
        let mut table = NameTable::new();
        table.claim(ResourceType::Topic, "b", "zeta");
        table.claim(ResourceType::Topic, "a", "zeta");
        table.claim(ResourceType::LogGroup, "q", "alpha");
        table.claim(ResourceType::Topic, "d", "alpha");
        table.claim(ResourceType::Topic, "c", "alpha");
        assert_eq!(table.len(), 5);

        assert_eq!(
            table.check_unique().unwrap_err(),
            SynthError::NameCollision {
                name: "alpha".into(),
                node_ids: vec!["c".into(), "d".into()],
            }
        );
    }

    #[test]
    fn test_apply_injects_name_property() {
        let mut stack = Stack::new("s", context());
        stack.add(ResourceNode::new("Alerts", ResourceType::Topic)).unwrap();
        stack.add(ResourceNode::new("Key", ResourceType::Key)).unwrap();

        let names = NamingConvention::default().apply(&mut stack).unwrap();
        assert_eq!(names.get("Alerts"), Some("prod-pr7-alerts"));
        assert_eq!(names.get("Key"), Some("prod-pr7-key"));
        assert_eq!(
            stack.node("Alerts").unwrap().property("TopicName"),
            Some(&Value::from("prod-pr7-alerts"))
        );
        assert!(stack.node("Key").unwrap().properties().is_empty());
    }

    #[test]
    fn test_collision_within_kind_is_rejected() {
        let mut stack = Stack::new("s", context());
        stack.add(ResourceNode::new("my_topic", ResourceType::Topic)).unwrap();
        stack.add(ResourceNode::new("MyTopic", ResourceType::Topic)).unwrap();

        let err = NamingConvention::default().apply(&mut stack).unwrap_err();
        assert_eq!(
            err,
            SynthError::NameCollision {
                name: "prod-pr7-my-topic".into(),
                node_ids: vec!["MyTopic".into(), "my_topic".into()],
            }
        );
    }

    #[test]
    fn test_same_name_across_kinds_is_allowed() {
        let mut stack = Stack::new("s", context());
        stack.add(ResourceNode::new("App", ResourceType::Topic)).unwrap();
        stack
            .add(
                ResourceNode::new("App2", ResourceType::LogGroup).with_physical_name("prod-pr7-app"),
            )
            .unwrap();
        assert!(NamingConvention::default().apply(&mut stack).is_ok());
    }
}
