//! Ready-made stacks for tests.

use serde_json::json;

use crate::config::EnvironmentContext;
use crate::core::ResourceType;
use crate::stack::{Output, Reference, ResourceNode, Stack, Value};

/// Suffix used by every fixture context.
pub const FIXTURE_SUFFIX: &str = "test";

/// Context with the fixture suffix and no account or region.
#[must_use]
pub fn context() -> EnvironmentContext {
    EnvironmentContext::new(FIXTURE_SUFFIX)
}

/// `key`, a bucket encrypted with it, and a policy on the bucket.
///
/// Levels: `[key]`, `[bucket]`, `[policy]`. Outputs `BucketArn` (exported) and
/// `ObjectsArn` (a join).
#[must_use]
pub fn key_bucket_policy_stack() -> Stack {
    let nodes = vec![
        ResourceNode::new("key", ResourceType::Key)
            .with_property("KeyPolicy", Value::literal(json!({"Version": "2012-10-17"}))),
        ResourceNode::new("bucket", ResourceType::Bucket)
            .with_property("KmsMasterKeyId", Reference::new("key", "arn"))
            .with_tag("Tier", "storage"),
        ResourceNode::new("policy", ResourceType::BucketPolicy)
            .with_property("Bucket", Reference::new("bucket", "name"))
            .with_property(
                "PolicyDocument",
                Value::map([(
                    "Resource",
                    Value::concat([Reference::new("bucket", "arn").into(), "/*".into()]),
                )]),
            ),
    ];
    stack_from(nodes, context())
}

/// Build a stack from `nodes` in the given order, plus the outputs of
/// [`key_bucket_policy_stack`].
///
/// # Panics
///
/// If two nodes share an id.
#[must_use]
pub fn stack_from(nodes: Vec<ResourceNode>, context: EnvironmentContext) -> Stack {
    let mut stack = Stack::new("Fixture", context);
    for node in nodes {
        stack.add(node).expect("fixture ids are unique");
    }
    stack.add_output(
        "BucketArn",
        Output::new(Reference::new("bucket", "arn")).with_export_name("fixture-bucket-arn"),
    );
    stack.add_output(
        "ObjectsArn",
        Output::new(Value::concat([Reference::new("bucket", "arn").into(), "/*".into()])),
    );
    stack
}

/// Three topics referencing each other in a ring `a → b → c → a`.
#[must_use]
pub fn cyclic_stack() -> Stack {
    let mut stack = Stack::new("Cycle", context());
    for (id, target) in [("a", "b"), ("b", "c"), ("c", "a")] {
        let node = ResourceNode::new(id, ResourceType::Topic)
            .with_property("DisplayName", Reference::new(target, "name"));
        stack.add(node).expect("fixture ids are unique");
    }
    stack
}

/// The file form of [`key_bucket_policy_stack`].
pub const KEY_BUCKET_POLICY_YAML: &str = r#"name: Fixture
resources:
  bucket:
    type: bucket
    properties:
      KmsMasterKeyId:
        Fn::GetAtt: [key, arn]
    tags:
      Tier: storage
  key:
    type: key
    properties:
      KeyPolicy:
        Version: "2012-10-17"
  policy:
    type: bucket-policy
    properties:
      Bucket:
        Fn::GetAtt: [bucket, name]
      PolicyDocument:
        Resource:
          Fn::Join:
            - ""
            - - Fn::GetAtt: [bucket, arn]
              - /*
outputs:
  BucketArn:
    value:
      Fn::GetAtt: [bucket, arn]
    exportName: fixture-bucket-arn
  ObjectsArn:
    value:
      Fn::Join:
        - ""
        - - Fn::GetAtt: [bucket, arn]
          - /*
"#;

/// A stack file with a two-node cycle.
pub const CYCLIC_YAML: &str = r#"name: Cycle
resources:
  a:
    type: topic
    properties:
      DisplayName:
        Fn::GetAtt: [b, name]
  b:
    type: topic
    dependsOn: [a]
"#;
