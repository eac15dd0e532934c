//! Byte-stable output and construction-order independence

use stacksynth::blueprint::secure_web_app;
use stacksynth::config::EnvironmentContext;
use stacksynth::stack::ResourceNode;
use stacksynth::synth::{Synthesizer, TemplateFormat};
use stacksynth::test_utils::fixtures;

fn render(stack: &stacksynth::stack::Stack, format: TemplateFormat) -> String {
    Synthesizer::new().synthesize(stack).unwrap().template.render(format).unwrap()
}

#[test]
fn test_five_runs_are_byte_identical() {
    let stack = secure_web_app(EnvironmentContext::new("det")).unwrap();
    let first = render(&stack, TemplateFormat::Json);
    for _ in 0..4 {
        assert_eq!(render(&stack, TemplateFormat::Json), first);
    }

    let yaml = render(&stack, TemplateFormat::Yaml);
    assert_eq!(render(&stack, TemplateFormat::Yaml), yaml);
}

#[test]
fn test_registration_order_does_not_matter() {
    let forward = fixtures::key_bucket_policy_stack();

    let nodes: Vec<ResourceNode> = forward.nodes().cloned().collect();
    let reversed: Vec<ResourceNode> = nodes.iter().rev().cloned().collect();
    let backward = fixtures::stack_from(reversed, fixtures::context());

    assert_eq!(render(&forward, TemplateFormat::Json), render(&backward, TemplateFormat::Json));
}

#[test]
fn test_same_synthesizer_can_run_twice() {
    let stack = fixtures::key_bucket_policy_stack();
    let mut synth = Synthesizer::new();
    let first = synth.synthesize(&stack).unwrap();
    let second = synth.synthesize(&stack).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_keys_are_sorted_in_json() {
    let rendered = render(&fixtures::key_bucket_policy_stack(), TemplateFormat::Json);
    let bucket = rendered.find("\"bucket\": {").unwrap();
    let key = rendered.find("\"key\": {").unwrap();
    let policy = rendered.find("\"policy\": {").unwrap();
    assert!(bucket < key && key < policy);
    assert!(rendered.ends_with("}\n"));
}

#[test]
fn test_different_suffixes_differ_only_by_environment() {
    let a = render(&secure_web_app(EnvironmentContext::new("aaa")).unwrap(), TemplateFormat::Json);
    let b = render(&secure_web_app(EnvironmentContext::new("bbb")).unwrap(), TemplateFormat::Json);
    assert_ne!(a, b);
    assert!(!a.contains("prod-bbb"));
    assert!(!b.contains("prod-aaa"));
}
