//! The `stacksynth` binary

use predicates::prelude::*;

use crate::common::{TestProject, parse_json};
use stacksynth::test_utils::fixtures;

#[test]
fn test_synth_prints_blueprint_json() {
    let project = TestProject::new().unwrap();
    let output = project
        .stacksynth()
        .args(["synth", "-c", "environmentSuffix=ci"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let template = parse_json(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(template["Outputs"]["S3BucketName"]["Value"], "prod-ci-app-bucket");
    assert_eq!(template["Outputs"]["VPCId"]["Export"]["Name"], "prod-ci-vpc-id");
    assert_eq!(template["Resources"]["ProdS3Bucket"]["Type"], "AWS::S3::Bucket");
}

#[test]
fn test_synth_yaml_format() {
    let project = TestProject::new().unwrap();
    project
        .stacksynth()
        .args(["synth", "--format", "yaml", "-c", "environmentSuffix=ci"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("AWSTemplateFormatVersion: "))
        .stdout(predicate::str::contains("prod-ci-app-bucket"));
}

#[test]
fn test_synth_writes_output_file() {
    let project = TestProject::new().unwrap();
    project
        .stacksynth()
        .args(["synth", "--output", "out/template.json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let template = parse_json(&project.read_file("out/template.json").unwrap());
    assert_eq!(template["Outputs"]["S3BucketName"]["Value"], "prod-dev-app-bucket");
}

#[test]
fn test_synth_stack_file() {
    let project = TestProject::new().unwrap();
    project.write_file("stack.yaml", fixtures::KEY_BUCKET_POLICY_YAML).unwrap();

    let output = project
        .stacksynth()
        .args(["synth", "--stack", "stack.yaml", "-c", "environmentSuffix=test"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let template = parse_json(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(template["Resources"]["bucket"]["PhysicalName"], "prod-test-bucket");
    assert_eq!(template["Resources"]["policy"]["DependsOn"], serde_json::json!(["bucket"]));
    assert_eq!(template["Outputs"]["ObjectsArn"]["Value"], "arn:aws:s3:::prod-test-bucket/*");
}

#[test]
fn test_cycle_fails_with_kind() {
    let project = TestProject::new().unwrap();
    project.write_file("cycle.yaml", fixtures::CYCLIC_YAML).unwrap();

    project
        .stacksynth()
        .args(["synth", "--stack", "cycle.yaml"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error[cyclic-dependency]"));
}

#[test]
fn test_unknown_resource_type_is_rejected() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            "stack.yaml",
            "name: Bad\nresources:\n  thing:\n    type: frobnicator\n",
        )
        .unwrap();

    project
        .stacksynth()
        .args(["synth", "--stack", "stack.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[invalid-definition]"));
}

#[test]
fn test_missing_stack_file() {
    let project = TestProject::new().unwrap();
    project
        .stacksynth()
        .args(["synth", "--stack", "absent.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));
}

#[test]
fn test_graph_levels_and_order() {
    let project = TestProject::new().unwrap();
    project.write_file("stack.yaml", fixtures::KEY_BUCKET_POLICY_YAML).unwrap();

    project
        .stacksynth()
        .args(["graph", "--stack", "stack.yaml", "--format", "levels"])
        .assert()
        .success()
        .stdout("0: key\n1: bucket\n2: policy\n");

    project
        .stacksynth()
        .args(["graph", "--stack", "stack.yaml", "--format", "order"])
        .assert()
        .success()
        .stdout("key\nbucket\npolicy\n");
}

#[test]
fn test_graph_tree_starts_at_top_level_resource() {
    let project = TestProject::new().unwrap();
    project.write_file("stack.yaml", fixtures::KEY_BUCKET_POLICY_YAML).unwrap();

    project
        .stacksynth()
        .args(["graph", "--stack", "stack.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("policy"))
        .stdout(predicate::str::contains("key"));
}

#[test]
fn test_settings_file_prefix_and_tags() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            "settings.toml",
            "[naming]\nprefix = \"acme\"\n\n[tags]\nCostCenter = \"platform\"\n",
        )
        .unwrap();
    project.write_file("stack.yaml", fixtures::KEY_BUCKET_POLICY_YAML).unwrap();

    let output = project
        .stacksynth()
        .args(["--config", "settings.toml", "synth", "--stack", "stack.yaml"])
        .args(["-c", "environmentSuffix=qa"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let template = parse_json(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(template["Resources"]["bucket"]["PhysicalName"], "acme-qa-bucket");
    assert_eq!(template["Resources"]["key"]["Tags"]["CostCenter"], "platform");
}

#[test]
fn test_suffix_from_environment_variable() {
    let project = TestProject::new().unwrap();
    let output = project
        .stacksynth()
        .env("ENVIRONMENT_SUFFIX", "fromenv")
        .arg("synth")
        .output()
        .unwrap();
    assert!(output.status.success());

    let template = parse_json(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(template["Outputs"]["S3BucketName"]["Value"], "prod-fromenv-app-bucket");
}

#[test]
fn test_context_flag_beats_environment_variable() {
    let project = TestProject::new().unwrap();
    project
        .stacksynth()
        .env("ENVIRONMENT_SUFFIX", "fromenv")
        .args(["synth", "-c", "environmentSuffix=fromflag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prod-fromflag-app-bucket"))
        .stdout(predicate::str::contains("prod-fromenv").not());
}

#[test]
fn test_malformed_context_pair_is_a_usage_error() {
    let project = TestProject::new().unwrap();
    project
        .stacksynth()
        .args(["synth", "-c", "novalue"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

#[test]
fn test_sequential_output_matches_parallel() {
    let project = TestProject::new().unwrap();
    let parallel = project.stacksynth().arg("synth").output().unwrap();
    let sequential = project.stacksynth().args(["synth", "--sequential"]).output().unwrap();
    assert!(parallel.status.success());
    assert_eq!(parallel.stdout, sequential.stdout);
}
