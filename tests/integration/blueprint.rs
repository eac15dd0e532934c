//! The built-in secure web application

use stacksynth::blueprint::secure_web_app;
use stacksynth::config::EnvironmentContext;
use stacksynth::stack::Literal;
use stacksynth::synth::{SynthesizedStack, Synthesizer};

fn synthesize(context: EnvironmentContext) -> SynthesizedStack {
    let stack = secure_web_app(context).unwrap();
    Synthesizer::new().synthesize(&stack).unwrap()
}

#[test]
fn test_outputs_and_exports() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let outputs = &result.template.outputs;

    let expected = [
        ("VPCId", "prod-pr9-vpc-id"),
        ("S3BucketName", "prod-pr9-s3-bucket"),
        ("CloudFrontDomainName", "prod-pr9-cloudfront-domain"),
        ("LambdaFunctionArn", "prod-pr9-lambda-arn"),
        ("BastionHostId", "prod-pr9-bastion-id"),
        ("KMSKeyId", "prod-pr9-kms-key-id"),
    ];
    assert_eq!(outputs.len(), expected.len());
    for (name, export) in expected {
        let output = &outputs[name];
        assert_eq!(output.export.as_ref().map(|e| e.name.as_str()), Some(export), "{name}");
        assert!(output.description.is_some(), "{name}");
    }

    assert_eq!(
        result.template.output("LambdaFunctionArn").and_then(Literal::as_str),
        Some("arn:aws:lambda:${AWS::Region}:${AWS::AccountId}:function:prod-pr9-background-job")
    );
    assert!(
        result
            .template
            .output("VPCId")
            .and_then(Literal::as_str)
            .is_some_and(|id| id.starts_with("vpc-"))
    );
}

#[test]
fn test_explicit_names_follow_original_layout() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let names = &result.physical_names;

    assert_eq!(names["ProdKMSKeyAlias"], "alias/prod-pr9-key");
    assert_eq!(names["ProdS3Bucket"], "prod-pr9-app-bucket");
    assert_eq!(names["ProdAppSecrets"], "prod-pr9/app-secrets");
    assert_eq!(names["SSMParamlog-level"], "/prod-pr9/log-level");
    assert_eq!(names["ProdLambdaLogGroup"], "/aws/lambda/prod-pr9-background-job");
    assert_eq!(names["CloudTrailLogGroup"], "/aws/cloudtrail/prod-pr9");
    assert_eq!(names["ProdBastionHost"], "prod-pr9-bastion");
    assert_eq!(names["LambdaSG"], "prod-pr9-lambda-sg");
}

#[test]
fn test_account_pinned_bucket_names() {
    let context = EnvironmentContext::new("pr9").with_environment("123456789012", "us-east-1");
    let result = synthesize(context);

    let bucket = result.template.resource("ProdS3Bucket").unwrap();
    assert_eq!(bucket.physical_name, "prod-pr9-app-bucket-123456789012");
    let flow_logs = result.template.resource("VPCFlowLogsBucket").unwrap();
    assert_eq!(flow_logs.physical_name, "prod-pr9-vpc-flow-logs-123456789012");
}

#[test]
fn test_buckets_are_versioned_and_encrypted_with_stack_key() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let key_arn = result.attributes.get("ProdKMSKey", "arn").unwrap().to_json();

    for id in ["ProdS3Bucket", "ProdLoggingBucket", "VPCFlowLogsBucket"] {
        let bucket = result.template.resource(id).unwrap();
        assert_eq!(bucket.properties["VersioningConfiguration"].to_json()["Status"], "Enabled");
        let encryption = bucket.properties["BucketEncryption"].to_json();
        let default = &encryption["ServerSideEncryptionConfiguration"][0]
            ["ServerSideEncryptionByDefault"];
        assert_eq!(default["SSEAlgorithm"], "aws:kms");
        assert_eq!(default["KMSMasterKeyID"], key_arn, "{id}");
        assert_eq!(bucket.depends_on, vec!["ProdKMSKey"], "{id}");
    }
}

#[test]
fn test_trail_waits_for_logging_policy() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let position = |id: &str| result.order.iter().position(|n| n == id).unwrap();

    assert!(position("ProdLoggingBucketPolicy") < position("ProdCloudTrail"));
    assert!(position("ProdLambdaFunction") < position("LambdaErrorAlarm"));
    assert!(position("ProdLaunchTemplate") < position("ProdAutoScalingGroup"));

    let trail = result.template.resource("ProdCloudTrail").unwrap();
    assert!(trail.depends_on.contains(&"ProdLoggingBucketPolicy".to_string()));
    assert_eq!(trail.properties["S3BucketName"], Literal::from("prod-pr9-logging-bucket"));
}

#[test]
fn test_logging_policy_statements() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let policy = result.template.resource("ProdLoggingBucketPolicy").unwrap();
    let document = policy.properties["PolicyDocument"].to_json();
    let statements = document["Statement"].as_array().unwrap();

    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0]["Action"], "s3:PutObject");
    assert_eq!(statements[0]["Resource"], "arn:aws:s3:::prod-pr9-logging-bucket/*");
    assert_eq!(
        statements[0]["Condition"]["StringEquals"]["s3:x-amz-acl"],
        "bucket-owner-full-control"
    );
    assert_eq!(statements[1]["Action"], "s3:GetBucketAcl");
}

#[test]
fn test_auto_scaling_capacity() {
    let result = synthesize(EnvironmentContext::new("pr9"));
    let group = result.template.resource("ProdAutoScalingGroup").unwrap();
    assert_eq!(group.properties["MinSize"], Literal::from("1"));
    assert_eq!(group.properties["MaxSize"], Literal::from("3"));
    assert_eq!(group.properties["DesiredCapacity"], Literal::from("2"));
}
