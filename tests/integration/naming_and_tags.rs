//! Physical names and tag propagation

use std::collections::BTreeSet;

use stacksynth::config::{ContextOverrides, EnvironmentContext, Settings};
use stacksynth::core::{ResourceType, SynthError};
use stacksynth::stack::{Literal, Reference, ResourceNode, Stack, Value};
use stacksynth::synth::{NamingConvention, SynthState, Synthesizer};
use stacksynth::test_utils::{fake_env, fixtures};

#[test]
fn test_node_tag_beats_global_tag() {
    let context = EnvironmentContext::new("dev").with_tag("Env", "x").with_tag("Team", "core");
    let mut stack = Stack::new("s", context);
    stack.add(ResourceNode::new("a", ResourceType::Topic).with_tag("Env", "y")).unwrap();
    stack.add(ResourceNode::new("b", ResourceType::Topic)).unwrap();

    let template = Synthesizer::new().synthesize(&stack).unwrap().template;
    let a = &template.resource("a").unwrap().tags;
    assert_eq!(a["Env"], "y");
    assert_eq!(a["Team"], "core");
    assert_eq!(template.resource("b").unwrap().tags["Env"], "x");
}

#[test]
fn test_settings_tags_reach_every_resource() {
    let settings: Settings = toml::from_str(
        r#"
[tags]
CostCenter = "platform"
"#,
    )
    .unwrap();
    let env = fake_env(&[("REPOSITORY", "org/infra"), ("COMMIT_AUTHOR", "dev")]);
    let context = settings.build_context(&ContextOverrides::default(), &env);

    let stack = stacksynth::blueprint::secure_web_app(context).unwrap();
    let template = Synthesizer::new().synthesize(&stack).unwrap().template;

    for (id, resource) in &template.resources {
        assert_eq!(resource.tags.get("CostCenter").map(String::as_str), Some("platform"), "{id}");
        assert_eq!(resource.tags.get("Repository").map(String::as_str), Some("org/infra"), "{id}");
        assert_eq!(resource.tags.get("Author").map(String::as_str), Some("dev"), "{id}");
        assert_eq!(resource.tags.get("Environment").map(String::as_str), Some("dev"), "{id}");
    }
}

#[test]
fn test_derived_names_are_unique_per_kind() {
    let stack = stacksynth::blueprint::secure_web_app(EnvironmentContext::new("uniq")).unwrap();
    let result = Synthesizer::new().synthesize(&stack).unwrap();

    let mut seen = BTreeSet::new();
    for (id, resource) in &result.template.resources {
        assert!(
            seen.insert((resource.resource_type.clone(), resource.physical_name.clone())),
            "duplicate name for {id}"
        );
    }
}

#[test]
fn test_collision_aborts_synthesis() {
    let mut stack = Stack::new("s", fixtures::context());
    stack
        .add(ResourceNode::new("one", ResourceType::Topic).with_physical_name("shared"))
        .unwrap();
    stack
        .add(ResourceNode::new("two", ResourceType::Topic).with_property("TopicName", "shared"))
        .unwrap();

    let mut synth = Synthesizer::new();
    let err = synth.synthesize(&stack).unwrap_err();
    assert_eq!(
        err,
        SynthError::NameCollision {
            name: "shared".into(),
            node_ids: vec!["one".into(), "two".into()],
        }
    );
    assert_eq!(synth.state(), SynthState::NameCollisionError);
}

#[test]
fn test_joined_names_collide_after_resolution() {
    let mut stack = Stack::new("s", fixtures::context());
    stack.add(ResourceNode::new("Base", ResourceType::Topic)).unwrap();
    for id in ["one", "two"] {
        let name = Value::join("-", [Reference::new("Base", "name").into(), "alerts".into()]);
        let node = ResourceNode::new(id, ResourceType::Topic).with_property("TopicName", name);
        stack.add(node).unwrap();
    }

    let mut synth = Synthesizer::new();
    let err = synth.synthesize(&stack).unwrap_err();
    assert_eq!(
        err,
        SynthError::NameCollision {
            name: "prod-test-base-alerts".into(),
            node_ids: vec!["one".into(), "two".into()],
        }
    );
    assert_eq!(synth.state(), SynthState::NameCollisionError);
}

#[test]
fn test_joined_name_becomes_the_physical_name() {
    let mut stack = Stack::new("s", fixtures::context());
    stack.add(ResourceNode::new("Base", ResourceType::Topic)).unwrap();
    let name = Value::join("-", [Reference::new("Base", "name").into(), "alerts".into()]);
    let node = ResourceNode::new("one", ResourceType::Topic).with_property("TopicName", name);
    stack.add(node).unwrap();

    let result = Synthesizer::new().synthesize(&stack).unwrap();
    let one = result.template.resource("one").unwrap();
    assert_eq!(one.physical_name, "prod-test-base-alerts");
    assert_eq!(one.properties["TopicName"], Literal::from("prod-test-base-alerts"));
    assert_eq!(result.physical_names["one"], "prod-test-base-alerts");
    assert_eq!(
        result.attributes.get("one", "name"),
        Some(&Literal::from("prod-test-base-alerts"))
    );
}

#[test]
fn test_name_property_is_injected_and_explicit_kept() {
    let mut stack = Stack::new("s", fixtures::context());
    stack.add(ResourceNode::new("Alerts", ResourceType::Topic)).unwrap();
    stack
        .add(ResourceNode::new("Named", ResourceType::Topic).with_property("TopicName", "custom"))
        .unwrap();

    let template = Synthesizer::new().synthesize(&stack).unwrap().template;
    let alerts = template.resource("Alerts").unwrap();
    assert_eq!(alerts.physical_name, "prod-test-alerts");
    assert_eq!(alerts.properties["TopicName"], Literal::from("prod-test-alerts"));

    let named = template.resource("Named").unwrap();
    assert_eq!(named.physical_name, "custom");
    assert_eq!(named.properties["TopicName"], Literal::from("custom"));
}

#[test]
fn test_settings_prefix_changes_derived_names() {
    let mut synth = Synthesizer::new().with_naming(NamingConvention::new("acme"));
    let result = synth.synthesize(&fixtures::key_bucket_policy_stack()).unwrap();
    assert_eq!(result.physical_names["bucket"], "acme-test-bucket");
    assert_eq!(result.physical_names["key"], "acme-test-key");
}

#[test]
fn test_kinds_without_name_property_still_get_a_name() {
    let result = Synthesizer::new().synthesize(&fixtures::key_bucket_policy_stack()).unwrap();
    let key = result.template.resource("key").unwrap();
    assert_eq!(key.physical_name, "prod-test-key");
    assert!(!key.properties.contains_key("Name"));
}
