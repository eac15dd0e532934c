//! Stack definition files

use crate::common::TestProject;
use stacksynth::stack::StackDefinition;
use stacksynth::synth::Synthesizer;
use stacksynth::test_utils::fixtures;

#[test]
fn test_yaml_file_synthesizes_like_built_stack() {
    let project = TestProject::new().unwrap();
    let path = project.write_file("stack.yaml", fixtures::KEY_BUCKET_POLICY_YAML).unwrap();

    let from_file = StackDefinition::load(&path).unwrap().into_stack(fixtures::context()).unwrap();
    let built = fixtures::key_bucket_policy_stack();

    let a = Synthesizer::new().synthesize(&from_file).unwrap();
    let b = Synthesizer::new().synthesize(&built).unwrap();
    assert_eq!(a.template, b.template);
}

#[test]
fn test_json_file_round_trip() {
    let project = TestProject::new().unwrap();
    let definition = StackDefinition::from_stack(&fixtures::key_bucket_policy_stack());
    let path = project.write_file("stack.json", &definition.to_json_string().unwrap()).unwrap();

    let reloaded = StackDefinition::load(&path).unwrap();
    assert_eq!(reloaded, definition);
    assert_eq!(
        reloaded.into_stack(fixtures::context()).unwrap(),
        fixtures::key_bucket_policy_stack()
    );
}

#[test]
fn test_blueprint_survives_yaml_round_trip() {
    let stack = stacksynth::blueprint::secure_web_app(fixtures::context()).unwrap();
    let yaml = StackDefinition::from_stack(&stack).to_yaml_string().unwrap();
    let reparsed = StackDefinition::from_yaml_str(&yaml)
        .unwrap()
        .into_stack(stack.context().clone())
        .unwrap();

    let a = Synthesizer::new().synthesize(&stack).unwrap();
    let b = Synthesizer::new().synthesize(&reparsed).unwrap();
    assert_eq!(
        a.template.to_json_pretty().unwrap(),
        b.template.to_json_pretty().unwrap()
    );
}

#[test]
fn test_malformed_intrinsic_is_rejected() {
    let yaml = r#"name: Bad
resources:
  bucket:
    type: bucket
    properties:
      KmsMasterKeyId:
        Fn::GetAtt: [only-one]
"#;
    let err = StackDefinition::from_yaml_str(yaml).unwrap_err();
    assert_eq!(err.kind(), "invalid-definition");
}

#[test]
fn test_unknown_field_is_rejected() {
    let yaml = r#"name: Bad
resources:
  topic:
    type: topic
    propertes: {}
"#;
    assert!(StackDefinition::from_yaml_str(yaml).is_err());
}
