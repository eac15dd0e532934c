//! End-to-end synthesis through the public API

use serde_json::json;
use std::collections::BTreeMap;
use stacksynth::config::EnvironmentContext;
use stacksynth::core::{ResourceType, SynthError};
use stacksynth::resolver::{ProducerInput, ProducerRegistry};
use stacksynth::stack::{Literal, Output, Reference, ResourceNode, Stack, Value};
use stacksynth::synth::{SynthState, Synthesizer};
use stacksynth::test_utils::{fixtures, init_test_logging};

#[test]
fn test_key_bucket_policy_resolves_in_order() {
    init_test_logging(None);

    let stack = fixtures::key_bucket_policy_stack();
    let result = Synthesizer::new().synthesize(&stack).unwrap();

    assert_eq!(result.order, vec!["key", "bucket", "policy"]);
    assert_eq!(result.levels, vec![vec!["key"], vec!["bucket"], vec!["policy"]]);

    let key_arn = result.attributes.get("key", "arn").unwrap().as_str().unwrap().to_string();
    assert!(key_arn.starts_with("arn:aws:kms:${AWS::Region}:${AWS::AccountId}:key/"));

    let template = &result.template;
    let bucket = template.resource("bucket").unwrap();
    assert_eq!(bucket.resource_type, "AWS::S3::Bucket");
    assert_eq!(bucket.properties["KmsMasterKeyId"], Literal::String(key_arn));
    assert_eq!(bucket.properties["BucketName"], Literal::from("prod-test-bucket"));

    let policy = template.resource("policy").unwrap();
    assert_eq!(policy.depends_on, vec!["bucket"]);
    assert_eq!(policy.properties["Bucket"], Literal::from("prod-test-bucket"));
    assert_eq!(
        policy.properties["PolicyDocument"].to_json(),
        json!({"Resource": "arn:aws:s3:::prod-test-bucket/*"})
    );

    assert_eq!(
        template.output("ObjectsArn").and_then(Literal::as_str),
        Some("arn:aws:s3:::prod-test-bucket/*")
    );
    assert_eq!(template.outputs["BucketArn"].export.as_ref().unwrap().name, "fixture-bucket-arn");
}

#[test]
fn test_every_value_in_template_is_literal() {
    let result = Synthesizer::new().synthesize(&fixtures::key_bucket_policy_stack()).unwrap();
    let rendered = result.template.to_json_pretty().unwrap();
    assert!(!rendered.contains("Fn::GetAtt"));
    assert!(!rendered.contains("Fn::Join"));
}

#[test]
fn test_parallel_matches_sequential() {
    let stack = stacksynth::blueprint::secure_web_app(EnvironmentContext::new("par")).unwrap();
    let parallel = Synthesizer::new().synthesize(&stack).unwrap();
    let sequential = Synthesizer::new().with_parallel(false).synthesize(&stack).unwrap();
    assert_eq!(
        parallel.template.to_json_pretty().unwrap(),
        sequential.template.to_json_pretty().unwrap()
    );
}

#[test]
fn test_cycle_is_reported_with_path() {
    let mut synth = Synthesizer::new();
    let err = synth.synthesize(&fixtures::cyclic_stack()).unwrap_err();
    assert_eq!(
        err,
        SynthError::CyclicDependency {
            path: vec!["a".into(), "b".into(), "c".into(), "a".into()]
        }
    );
    assert_eq!(synth.state(), SynthState::CycleError);
}

#[test]
fn test_self_reference_is_a_cycle() {
    let mut stack = Stack::new("s", fixtures::context());
    stack
        .add(
            ResourceNode::new("loop", ResourceType::Topic)
                .with_property("DisplayName", Reference::new("loop", "name")),
        )
        .unwrap();

    let err = Synthesizer::new().synthesize(&stack).unwrap_err();
    assert_eq!(
        err,
        SynthError::CyclicDependency {
            path: vec!["loop".into(), "loop".into()]
        }
    );
}

#[test]
fn test_explicit_dependency_orders_without_reference() {
    let mut stack = Stack::new("s", fixtures::context());
    stack.add(ResourceNode::new("first", ResourceType::Topic).depends_on("second")).unwrap();
    stack.add(ResourceNode::new("second", ResourceType::Topic)).unwrap();

    let result = Synthesizer::new().synthesize(&stack).unwrap();
    assert_eq!(result.order, vec!["second", "first"]);
    assert_eq!(result.template.resource("first").unwrap().depends_on, vec!["second"]);
}

#[test]
fn test_forward_reference_to_missing_node_fails() {
    let mut stack = Stack::new("s", fixtures::context());
    stack
        .add(
            ResourceNode::new("bucket", ResourceType::Bucket)
                .with_property("KmsMasterKeyId", Reference::new("ghost", "arn")),
        )
        .unwrap();

    let mut synth = Synthesizer::new();
    let err = synth.synthesize(&stack).unwrap_err();
    assert_eq!(err.kind(), "unknown-target");
    assert_eq!(err.node_id(), Some("bucket"));
    assert_eq!(synth.state(), SynthState::CompositionError);
}

#[test]
fn test_missing_required_property_names_node_and_property() {
    let mut stack = Stack::new("s", fixtures::context());
    stack
        .add(ResourceNode::new("role", ResourceType::Role).with_property("Path", "/"))
        .unwrap();

    let err = Synthesizer::new().synthesize(&stack).unwrap_err();
    assert_eq!(
        err,
        SynthError::MissingRequiredProperty {
            node_id: "role".into(),
            property: "AssumeRolePolicyDocument".into(),
        }
    );
}

#[test]
fn test_join_of_list_is_invalid() {
    let mut stack = Stack::new("s", fixtures::context());
    stack.add(ResourceNode::new("topic", ResourceType::Topic)).unwrap();
    stack
        .add(
            ResourceNode::new("other", ResourceType::Topic).with_property(
                "DisplayName",
                Value::concat([
                    Reference::new("topic", "name").into(),
                    Value::literal(json!(["x"])),
                ]),
            ),
        )
        .unwrap();

    let err = Synthesizer::new().synthesize(&stack).unwrap_err();
    assert_eq!(err.kind(), "invalid-property-value");
    assert_eq!(err.node_id(), Some("other"));
}

#[test]
fn test_missing_producer_surfaces_internal_error() {
    fn no_attributes(_: &ProducerInput<'_>) -> BTreeMap<String, Literal> {
        BTreeMap::new()
    }

    let mut registry = ProducerRegistry::with_defaults();
    registry.register(ResourceType::Key, no_attributes);

    let mut synth = Synthesizer::new().with_registry(registry);
    let err = synth.synthesize(&fixtures::key_bucket_policy_stack()).unwrap_err();
    assert!(err.is_internal());
    assert_eq!(synth.state(), SynthState::UnresolvedReferenceError);
}

#[test]
fn test_outputs_reference_any_node() {
    let mut stack = fixtures::key_bucket_policy_stack();
    stack.add_output(
        "KeyId",
        Output::new(Reference::new("key", "id")).with_description("Key id"),
    );

    let result = Synthesizer::new().synthesize(&stack).unwrap();
    let key_id = result.attributes.get("key", "id").cloned();
    assert_eq!(result.template.output("KeyId").cloned(), key_id);
    assert_eq!(result.template.outputs["KeyId"].description.as_deref(), Some("Key id"));
}

#[test]
fn test_pinned_environment_appears_in_arns() {
    let context = fixtures::context().with_environment("123456789012", "eu-central-1");
    let mut stack = Stack::new("s", context);
    stack.add(ResourceNode::new("alerts", ResourceType::Topic)).unwrap();

    let result = Synthesizer::new().synthesize(&stack).unwrap();
    assert_eq!(
        result.attributes.get("alerts", "arn").and_then(Literal::as_str),
        Some("arn:aws:sns:eu-central-1:123456789012:prod-test-alerts")
    );
}
