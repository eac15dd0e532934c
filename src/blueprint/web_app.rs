//! Secure multi-tier web application.
//!
//! Layout, by dependency level:
//!
//! ```text
//! key ─┬─► key alias
//!      ├─► buckets (app, logging, flow logs) ─► bucket policies, flow log, trail
//!      └─► lambda role ─► lambda function ─► error alarm
//! vpc ──► security groups ─► launch template ─► auto scaling group
//!                          └─► bastion host
//! oai ──► app bucket policy, distribution
//! ```

use serde_json::json;

use crate::config::EnvironmentContext;
use crate::core::{ResourceType, SynthError};
use crate::stack::{Output, ResourceNode, Stack, Value};

const KEY: &str = "ProdKMSKey";
const KEY_ALIAS: &str = "ProdKMSKeyAlias";
const VPC: &str = "ProdVPC";
const FLOW_LOGS_BUCKET: &str = "VPCFlowLogsBucket";
const FLOW_LOG: &str = "VPCFlowLog";
const LAMBDA_SG: &str = "LambdaSG";
const EC2_SG: &str = "EC2SG";
const BASTION_SG: &str = "BastionSG";
const APP_BUCKET: &str = "ProdS3Bucket";
const APP_BUCKET_POLICY: &str = "ProdS3BucketPolicy";
const LOGGING_BUCKET: &str = "ProdLoggingBucket";
const LOGGING_BUCKET_POLICY: &str = "ProdLoggingBucketPolicy";
const SECRET: &str = "ProdAppSecrets";
const ALERTS: &str = "ProdSecurityAlerts";
const LAMBDA_ROLE: &str = "ProdLambdaRole";
const LAMBDA_LOG_GROUP: &str = "ProdLambdaLogGroup";
const LAMBDA: &str = "ProdLambdaFunction";
const EC2_ROLE: &str = "ProdEC2Role";
const LAUNCH_TEMPLATE: &str = "ProdLaunchTemplate";
const ASG: &str = "ProdAutoScalingGroup";
const BASTION: &str = "ProdBastionHost";
const OAI: &str = "ProdCloudFrontOAI";
const DISTRIBUTION: &str = "ProdCloudFrontDist";
const WAF: &str = "ProdWAF";
const TRAIL: &str = "ProdCloudTrail";
const TRAIL_LOG_GROUP: &str = "CloudTrailLogGroup";
const LAMBDA_ALARM: &str = "LambdaErrorAlarm";

const AMAZON_LINUX_2: &str =
    "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}";
const CACHING_OPTIMIZED_POLICY: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";
const APP_ORIGIN: &str = "ProdS3Origin";
/// `#!/bin/bash`, base64
const USER_DATA: &str = "IyEvYmluL2Jhc2g=";
const KMS_DATA_ACTIONS: [&str; 5] = [
    "kms:Encrypt",
    "kms:Decrypt",
    "kms:ReEncrypt*",
    "kms:GenerateDataKey*",
    "kms:DescribeKey",
];

const SSM_PARAMETERS: [(&str, &str); 3] =
    [("app-version", "1.0.0"), ("log-level", "INFO"), ("max-connections", "100")];

const LAMBDA_SOURCE: &str = r#"import json
import logging
import os
from datetime import datetime

logger = logging.getLogger()
logger.setLevel(logging.INFO)


def lambda_handler(event, context):
    try:
        logger.info(f"Processing background job: {json.dumps(event)}")
        result = {
            'status': 'success',
            'timestamp': datetime.utcnow().isoformat() + 'Z',
            'environment': os.environ.get('ENVIRONMENT', 'unknown'),
            'processed_records': len(event.get('records', [])),
            'request_id': context.aws_request_id,
        }
        logger.info(f"Background job completed successfully: {result}")
        return {'statusCode': 200, 'body': json.dumps(result)}
    except Exception as e:
        logger.error(f"Error processing background job: {str(e)}")
        return {
            'statusCode': 500,
            'body': json.dumps({'error': 'Background job failed', 'message': str(e)}),
        }
"#;

/// Compose the secure web application stack for `context`.
///
/// Adds the stack-level tags `Environment`, `Project` and `ManagedBy` to the context's
/// global tags. Bucket names carry the account id when the context pins one.
///
/// # Errors
///
/// Only if the composition itself is inconsistent, which would be a defect here.
pub fn secure_web_app(context: EnvironmentContext) -> Result<Stack, SynthError> {
    let suffix = context.suffix().to_string();
    let project = format!("prod-{suffix}");
    let context = context
        .with_tag("Environment", suffix.as_str())
        .with_tag("Project", project.as_str())
        .with_tag("ManagedBy", "stacksynth");

    let mut app = WebApp {
        stack: Stack::new(format!("TapStack{suffix}"), context)
            .with_description(format!("Secure multi-tier web application for {project}")),
        project,
    };

    app.encryption()?;
    app.networking()?;
    app.security_groups()?;
    app.storage()?;
    app.configuration()?;
    app.alerts()?;
    app.background_job()?;
    app.compute()?;
    app.bastion()?;
    app.content_delivery()?;
    app.firewall()?;
    app.monitoring()?;
    app.outputs()?;

    tracing::debug!("Composed '{}' with {} resources", app.stack.name(), app.stack.len());
    Ok(app.stack)
}

struct WebApp {
    stack: Stack,
    /// `prod-<suffix>`
    project: String,
}

impl WebApp {
    fn name(&self, part: &str) -> String {
        format!("{}-{part}", self.project)
    }

    /// Bucket name, with the account appended when one is pinned.
    fn bucket_name(&self, part: &str) -> String {
        match self.stack.context().account() {
            Some(account) => format!("{}-{part}-{account}", self.project),
            None => self.name(part),
        }
    }

    fn get(&self, id: &str, attribute: &str) -> Result<Value, SynthError> {
        self.stack.reference(id, attribute)
    }

    fn encrypted_bucket(&self, id: &str, part: &str) -> Result<ResourceNode, SynthError> {
        Ok(ResourceNode::new(id, ResourceType::Bucket)
            .with_property("BucketName", self.bucket_name(part))
            .with_property(
                "VersioningConfiguration",
                Value::literal(json!({"Status": "Enabled"})),
            )
            .with_property(
                "BucketEncryption",
                Value::map([(
                    "ServerSideEncryptionConfiguration",
                    Value::list([Value::map([(
                        "ServerSideEncryptionByDefault",
                        Value::map([
                            ("SSEAlgorithm", Value::from("aws:kms")),
                            ("KMSMasterKeyID", self.get(KEY, "arn")?),
                        ]),
                    )])]),
                )]),
            )
            .with_tag("Name", self.name(part)))
    }

    fn encryption(&mut self) -> Result<(), SynthError> {
        let key = ResourceNode::new(KEY, ResourceType::Key)
            .with_property(
                "Description",
                format!("Customer-managed KMS key for {} environment", self.project),
            )
            .with_property("KeySpec", "SYMMETRIC_DEFAULT")
            .with_property("KeyUsage", "ENCRYPT_DECRYPT")
            .with_property(
                "KeyPolicy",
                Value::literal(json!({
                    "Version": "2012-10-17",
                    "Statement": [
                        {
                            "Effect": "Allow",
                            "Principal": {"AWS": "arn:aws:iam::${AWS::AccountId}:root"},
                            "Action": "kms:*",
                            "Resource": "*"
                        },
                        {
                            "Effect": "Allow",
                            "Principal": {"Service": [
                                "s3.amazonaws.com",
                                "lambda.amazonaws.com",
                                "logs.amazonaws.com"
                            ]},
                            "Action": KMS_DATA_ACTIONS,
                            "Resource": "*"
                        }
                    ]
                })),
            )
            .with_tag("Name", self.name("kms-key"));
        self.stack.add(key)?;

        let alias = ResourceNode::new(KEY_ALIAS, ResourceType::KeyAlias)
            .with_property("AliasName", format!("alias/{}-key", self.project))
            .with_property("TargetKeyId", self.get(KEY, "id")?);
        self.stack.add(alias)
    }

    fn networking(&mut self) -> Result<(), SynthError> {
        let vpc = ResourceNode::new(VPC, ResourceType::Vpc)
            .with_physical_name(self.name("vpc"))
            .with_property("CidrBlock", "10.0.0.0/16")
            .with_property("EnableDnsHostnames", true)
            .with_property("EnableDnsSupport", true)
            .with_tag("Name", self.name("vpc"));
        self.stack.add(vpc)?;

        let bucket = self.encrypted_bucket(FLOW_LOGS_BUCKET, "vpc-flow-logs")?.with_property(
            "PublicAccessBlockConfiguration",
            block_public_access(true),
        );
        self.stack.add(bucket)?;

        let flow_log = ResourceNode::new(FLOW_LOG, ResourceType::FlowLog)
            .with_property("ResourceId", self.get(VPC, "id")?)
            .with_property("ResourceType", "VPC")
            .with_property("TrafficType", "ALL")
            .with_property("LogDestinationType", "s3")
            .with_property(
                "LogDestination",
                Value::concat([self.get(FLOW_LOGS_BUCKET, "arn")?, "/vpc-flow-logs/".into()]),
            );
        self.stack.add(flow_log)
    }

    fn security_groups(&mut self) -> Result<(), SynthError> {
        let vpc_id = self.get(VPC, "id")?;

        let lambda = ResourceNode::new(LAMBDA_SG, ResourceType::SecurityGroup)
            .with_property("GroupDescription", "Security group for Lambda functions")
            .with_property("VpcId", vpc_id.clone())
            .with_property(
                "SecurityGroupEgress",
                Value::literal(json!([{
                    "IpProtocol": "tcp",
                    "FromPort": 443,
                    "ToPort": 443,
                    "CidrIp": "0.0.0.0/0",
                    "Description": "HTTPS outbound for AWS API calls"
                }])),
            )
            .with_tag("Name", self.name("lambda-sg"));

        let bastion = ResourceNode::new(BASTION_SG, ResourceType::SecurityGroup)
            .with_property("GroupDescription", "Security group for bastion host SSH access")
            .with_property("VpcId", vpc_id.clone())
            .with_property(
                "SecurityGroupIngress",
                Value::literal(json!([{
                    "IpProtocol": "tcp",
                    "FromPort": 22,
                    "ToPort": 22,
                    "CidrIp": "0.0.0.0/0",
                    "Description": "SSH access from anywhere (restrict to specific IPs in production)"
                }])),
            )
            .with_tag("Name", self.name("bastion-sg"));

        self.stack.add(lambda)?;
        self.stack.add(bastion)?;

        let ec2 = ResourceNode::new(EC2_SG, ResourceType::SecurityGroup)
            .with_property("GroupDescription", "Security group for EC2 instances in private subnets")
            .with_property("VpcId", vpc_id)
            .with_property(
                "SecurityGroupIngress",
                Value::list([Value::map([
                    ("IpProtocol", Value::from("tcp")),
                    ("FromPort", Value::from(22_u32)),
                    ("ToPort", Value::from(22_u32)),
                    ("SourceSecurityGroupId", self.get(BASTION_SG, "id")?),
                    ("Description", Value::from("SSH from bastion host")),
                ])]),
            )
            .with_tag("Name", self.name("ec2-sg"));
        self.stack.add(ec2)
    }

    fn storage(&mut self) -> Result<(), SynthError> {
        let app = self
            .encrypted_bucket(APP_BUCKET, "app-bucket")?
            .with_property("PublicAccessBlockConfiguration", block_public_access(true));
        self.stack.add(app)?;

        // CloudFront log delivery needs RestrictPublicBuckets off.
        let logging = self
            .encrypted_bucket(LOGGING_BUCKET, "logging-bucket")?
            .with_property("PublicAccessBlockConfiguration", block_public_access(false))
            .with_property(
                "OwnershipControls",
                Value::literal(json!({"Rules": [{"ObjectOwnership": "BucketOwnerPreferred"}]})),
            );
        self.stack.add(logging)?;

        let logging_arn = self.get(LOGGING_BUCKET, "arn")?;
        let cloudtrail = || Value::literal(json!({"Service": "cloudtrail.amazonaws.com"}));
        let policy = ResourceNode::new(LOGGING_BUCKET_POLICY, ResourceType::BucketPolicy)
            .with_property("Bucket", self.get(LOGGING_BUCKET, "name")?)
            .with_property(
                "PolicyDocument",
                Value::map([
                    ("Version", Value::from("2012-10-17")),
                    (
                        "Statement",
                        Value::list([
                            Value::map([
                                ("Effect", Value::from("Allow")),
                                ("Principal", cloudtrail()),
                                ("Action", Value::from("s3:PutObject")),
                                ("Resource", Value::concat([logging_arn.clone(), "/*".into()])),
                                (
                                    "Condition",
                                    Value::literal(json!({
                                        "StringEquals": {"s3:x-amz-acl": "bucket-owner-full-control"}
                                    })),
                                ),
                            ]),
                            Value::map([
                                ("Effect", Value::from("Allow")),
                                ("Principal", cloudtrail()),
                                ("Action", Value::from("s3:GetBucketAcl")),
                                ("Resource", logging_arn.clone()),
                            ]),
                            Value::map([
                                ("Effect", Value::from("Allow")),
                                ("Principal", cloudtrail()),
                                (
                                    "Action",
                                    Value::literal(json!([
                                        "s3:GetBucketLocation",
                                        "s3:GetBucketVersioning"
                                    ])),
                                ),
                                ("Resource", logging_arn),
                            ]),
                        ]),
                    ),
                ]),
            );
        self.stack.add(policy)
    }

    fn configuration(&mut self) -> Result<(), SynthError> {
        let secret = ResourceNode::new(SECRET, ResourceType::Secret)
            .with_property("Name", format!("{}/app-secrets", self.project))
            .with_property("Description", "Application secrets for production environment")
            .with_property(
                "GenerateSecretString",
                Value::literal(json!({
                    "SecretStringTemplate": "{\"username\": \"admin\"}",
                    "GenerateStringKey": "password",
                    "ExcludeCharacters": "\"@/\\"
                })),
            )
            .with_tag("Name", self.name("app-secrets"));
        self.stack.add(secret)?;

        let suffix = self.stack.context().suffix().to_string();
        let parameters =
            std::iter::once(("app-environment", suffix.as_str())).chain(SSM_PARAMETERS);
        for (key, value) in parameters {
            let parameter = ResourceNode::new(format!("SSMParam{key}"), ResourceType::Parameter)
                .with_property("Name", format!("/{}/{key}", self.project))
                .with_property("Type", "String")
                .with_property("Value", value)
                .with_property("Description", format!("Configuration parameter for {key}"));
            self.stack.add(parameter)?;
        }
        Ok(())
    }

    fn alerts(&mut self) -> Result<(), SynthError> {
        let topic = ResourceNode::new(ALERTS, ResourceType::Topic)
            .with_property("TopicName", self.name("security-alerts"))
            .with_property("DisplayName", "Production Security Alerts")
            .with_tag("Name", self.name("security-alerts"));
        self.stack.add(topic)
    }

    fn background_job(&mut self) -> Result<(), SynthError> {
        let bucket_arn = self.get(APP_BUCKET, "arn")?;
        let role = ResourceNode::new(LAMBDA_ROLE, ResourceType::Role)
            .with_property("RoleName", self.name("lambda-role"))
            .with_property("AssumeRolePolicyDocument", assume_role_policy("lambda.amazonaws.com"))
            .with_property(
                "ManagedPolicyArns",
                Value::literal(json!([
                    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole"
                ])),
            )
            .with_property(
                "Policies",
                Value::list([
                    inline_policy(
                        "S3Access",
                        Value::literal(json!(["s3:GetObject", "s3:PutObject"])),
                        Value::list([
                            bucket_arn.clone(),
                            Value::concat([bucket_arn, "/*".into()]),
                        ]),
                    ),
                    inline_policy(
                        "KMSAccess",
                        Value::literal(json!(KMS_DATA_ACTIONS)),
                        Value::list([self.get(KEY, "arn")?]),
                    ),
                ]),
            )
            .with_tag("Name", self.name("lambda-role"));
        self.stack.add(role)?;

        let log_group = ResourceNode::new(LAMBDA_LOG_GROUP, ResourceType::LogGroup)
            .with_property("LogGroupName", format!("/aws/lambda/{}-background-job", self.project))
            .with_property("RetentionInDays", 30_u32);
        self.stack.add(log_group)?;

        let function = ResourceNode::new(LAMBDA, ResourceType::Function)
            .with_property("FunctionName", self.name("background-job"))
            .with_property("Description", "Background job processing Lambda function")
            .with_property("Runtime", "python3.9")
            .with_property("Handler", "index.lambda_handler")
            .with_property("Code", Value::literal(json!({"ZipFile": LAMBDA_SOURCE})))
            .with_property("MemorySize", 256_u32)
            .with_property("Timeout", 30_u32)
            .with_property("Role", self.get(LAMBDA_ROLE, "arn")?)
            .with_property(
                "LoggingConfig",
                Value::map([("LogGroup", self.get(LAMBDA_LOG_GROUP, "name")?)]),
            )
            .with_property(
                "VpcConfig",
                Value::map([("SecurityGroupIds", Value::list([self.get(LAMBDA_SG, "id")?]))]),
            )
            .with_property(
                "Environment",
                Value::map([(
                    "Variables",
                    Value::map([
                        ("ENVIRONMENT", Value::from(self.stack.context().suffix())),
                        ("S3_BUCKET", self.get(APP_BUCKET, "name")?),
                        ("LOG_LEVEL", Value::from("INFO")),
                    ]),
                )]),
            )
            .with_property("TracingConfig", Value::literal(json!({"Mode": "Active"})))
            .with_property("Architectures", Value::literal(json!(["x86_64"])))
            .with_tag("Name", self.name("lambda"));
        self.stack.add(function)
    }

    fn compute(&mut self) -> Result<(), SynthError> {
        let role = ResourceNode::new(EC2_ROLE, ResourceType::Role)
            .with_property("RoleName", self.name("ec2-role"))
            .with_property("AssumeRolePolicyDocument", assume_role_policy("ec2.amazonaws.com"))
            .with_property(
                "ManagedPolicyArns",
                Value::literal(json!(["arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore"])),
            )
            .with_tag("Name", self.name("ec2-role"));
        self.stack.add(role)?;

        let template = ResourceNode::new(LAUNCH_TEMPLATE, ResourceType::LaunchTemplate)
            .with_property("LaunchTemplateName", self.name("lt"))
            .with_property(
                "LaunchTemplateData",
                Value::map([
                    ("InstanceType", Value::from("t3.micro")),
                    ("ImageId", Value::from(AMAZON_LINUX_2)),
                    ("IamInstanceProfile", Value::map([("Name", self.get(EC2_ROLE, "name")?)])),
                    ("SecurityGroupIds", Value::list([self.get(EC2_SG, "id")?])),
                    ("UserData", Value::from(USER_DATA)),
                ]),
            );
        self.stack.add(template)?;

        let group = ResourceNode::new(ASG, ResourceType::AutoScalingGroup)
            .with_property("AutoScalingGroupName", self.name("asg"))
            .with_property("MinSize", "1")
            .with_property("MaxSize", "3")
            .with_property("DesiredCapacity", "2")
            .with_property(
                "LaunchTemplate",
                Value::map([
                    ("LaunchTemplateId", self.get(LAUNCH_TEMPLATE, "id")?),
                    ("Version", self.get(LAUNCH_TEMPLATE, "latestVersionNumber")?),
                ]),
            )
            .with_tag("Name", self.name("asg"));
        self.stack.add(group)
    }

    fn bastion(&mut self) -> Result<(), SynthError> {
        let host = ResourceNode::new(BASTION, ResourceType::Instance)
            .with_physical_name(self.name("bastion"))
            .with_property("InstanceType", "t3.nano")
            .with_property("ImageId", AMAZON_LINUX_2)
            .with_property("SecurityGroupIds", Value::list([self.get(BASTION_SG, "id")?]))
            .with_tag("Name", self.name("bastion"));
        self.stack.add(host)
    }

    fn content_delivery(&mut self) -> Result<(), SynthError> {
        let oai = ResourceNode::new(OAI, ResourceType::OriginAccessIdentity).with_property(
            "CloudFrontOriginAccessIdentityConfig",
            Value::literal(json!({"Comment": format!("OAI for {} S3 bucket", self.project)})),
        );
        self.stack.add(oai)?;

        let read_grant = ResourceNode::new(APP_BUCKET_POLICY, ResourceType::BucketPolicy)
            .with_property("Bucket", self.get(APP_BUCKET, "name")?)
            .with_property(
                "PolicyDocument",
                Value::map([
                    ("Version", Value::from("2012-10-17")),
                    (
                        "Statement",
                        Value::list([Value::map([
                            ("Effect", Value::from("Allow")),
                            (
                                "Principal",
                                Value::map([("CanonicalUser", self.get(OAI, "s3CanonicalUserId")?)]),
                            ),
                            (
                                "Action",
                                Value::literal(json!(["s3:GetObject*", "s3:GetBucket*", "s3:List*"])),
                            ),
                            (
                                "Resource",
                                Value::list([
                                    self.get(APP_BUCKET, "arn")?,
                                    Value::concat([self.get(APP_BUCKET, "arn")?, "/*".into()]),
                                ]),
                            ),
                        ])]),
                    ),
                ]),
            );
        self.stack.add(read_grant)?;

        let distribution = ResourceNode::new(DISTRIBUTION, ResourceType::Distribution)
            .with_property(
                "DistributionConfig",
                Value::map([
                    ("Comment", Value::from(format!("CloudFront distribution for {}", self.project))),
                    ("Enabled", Value::from(true)),
                    ("IPV6Enabled", Value::from(false)),
                    ("PriceClass", Value::from("PriceClass_100")),
                    (
                        "DefaultCacheBehavior",
                        Value::literal(json!({
                            "TargetOriginId": APP_ORIGIN,
                            "ViewerProtocolPolicy": "redirect-to-https",
                            "CachePolicyId": CACHING_OPTIMIZED_POLICY
                        })),
                    ),
                    (
                        "Origins",
                        Value::list([Value::map([
                            ("Id", Value::from(APP_ORIGIN)),
                            ("DomainName", self.get(APP_BUCKET, "regionalDomainName")?),
                            (
                                "S3OriginConfig",
                                Value::map([(
                                    "OriginAccessIdentity",
                                    Value::concat([
                                        "origin-access-identity/cloudfront/".into(),
                                        self.get(OAI, "id")?,
                                    ]),
                                )]),
                            ),
                        ])]),
                    ),
                    (
                        "Logging",
                        Value::map([
                            ("Bucket", self.get(LOGGING_BUCKET, "regionalDomainName")?),
                            ("Prefix", Value::from("cloudfront-logs/")),
                            ("IncludeCookies", Value::from(false)),
                        ]),
                    ),
                ]),
            )
            .with_tag("Name", self.name("cloudfront"));
        self.stack.add(distribution)
    }

    fn firewall(&mut self) -> Result<(), SynthError> {
        let waf = self.name("waf");
        let acl = ResourceNode::new(WAF, ResourceType::WebAcl)
            .with_property("Name", waf.as_str())
            .with_property("Scope", "CLOUDFRONT")
            .with_property("DefaultAction", Value::literal(json!({"Allow": {}})))
            .with_property(
                "Rules",
                Value::literal(json!([{
                    "Name": "AWSManagedRulesCommonRuleSet",
                    "Priority": 1,
                    "Statement": {
                        "ManagedRuleGroupStatement": {
                            "VendorName": "AWS",
                            "Name": "AWSManagedRulesCommonRuleSet"
                        }
                    },
                    "OverrideAction": {"None": {}},
                    "VisibilityConfig": {
                        "SampledRequestsEnabled": true,
                        "CloudWatchMetricsEnabled": true,
                        "MetricName": "CommonRuleSetMetric"
                    }
                }])),
            )
            .with_property(
                "VisibilityConfig",
                Value::literal(json!({
                    "SampledRequestsEnabled": true,
                    "CloudWatchMetricsEnabled": true,
                    "MetricName": waf
                })),
            );
        self.stack.add(acl)
    }

    fn monitoring(&mut self) -> Result<(), SynthError> {
        let log_group = ResourceNode::new(TRAIL_LOG_GROUP, ResourceType::LogGroup)
            .with_property("LogGroupName", format!("/aws/cloudtrail/{}", self.project))
            .with_property("RetentionInDays", 30_u32);
        self.stack.add(log_group)?;

        let trail = ResourceNode::new(TRAIL, ResourceType::Trail)
            .with_property("TrailName", self.name("cloudtrail"))
            .with_property("IsLogging", true)
            .with_property("S3BucketName", self.get(LOGGING_BUCKET, "name")?)
            .with_property("S3KeyPrefix", "cloudtrail-logs/")
            .with_property("IncludeGlobalServiceEvents", true)
            .with_property("IsMultiRegionTrail", true)
            .with_property("EnableLogFileValidation", true)
            .with_property("CloudWatchLogsLogGroupArn", self.get(TRAIL_LOG_GROUP, "arn")?)
            .depends_on(LOGGING_BUCKET_POLICY)
            .with_tag("Name", self.name("cloudtrail"));
        self.stack.add(trail)?;

        let alarm = ResourceNode::new(LAMBDA_ALARM, ResourceType::Alarm)
            .with_property("AlarmName", self.name("lambda-errors"))
            .with_property("AlarmDescription", "Lambda function error rate")
            .with_property("Namespace", "AWS/Lambda")
            .with_property("MetricName", "Errors")
            .with_property(
                "Dimensions",
                Value::list([Value::map([
                    ("Name", Value::from("FunctionName")),
                    ("Value", self.get(LAMBDA, "name")?),
                ])]),
            )
            .with_property("Statistic", "Sum")
            .with_property("Period", 300_u32)
            .with_property("Threshold", 1_u32)
            .with_property("EvaluationPeriods", 2_u32)
            .with_property("ComparisonOperator", "GreaterThanOrEqualToThreshold")
            .with_property("TreatMissingData", "notBreaching");
        self.stack.add(alarm)
    }

    fn outputs(&mut self) -> Result<(), SynthError> {
        let outputs = [
            ("VPCId", VPC, "id", "VPC ID", "vpc-id"),
            ("S3BucketName", APP_BUCKET, "name", "S3 Bucket Name", "s3-bucket"),
            (
                "CloudFrontDomainName",
                DISTRIBUTION,
                "domainName",
                "CloudFront Distribution Domain Name",
                "cloudfront-domain",
            ),
            ("LambdaFunctionArn", LAMBDA, "arn", "Lambda Function ARN", "lambda-arn"),
            ("BastionHostId", BASTION, "id", "Bastion Host Instance ID", "bastion-id"),
            ("KMSKeyId", KEY, "id", "KMS Key ID", "kms-key-id"),
        ];

        for (name, target, attribute, description, export) in outputs {
            let output = Output::new(self.get(target, attribute)?)
                .with_description(description)
                .with_export_name(self.name(export));
            self.stack.add_output(name, output);
        }
        Ok(())
    }
}

fn block_public_access(restrict_public_buckets: bool) -> Value {
    Value::literal(json!({
        "BlockPublicAcls": true,
        "BlockPublicPolicy": true,
        "IgnorePublicAcls": true,
        "RestrictPublicBuckets": restrict_public_buckets
    }))
}

fn assume_role_policy(service: &str) -> Value {
    Value::literal(json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"Service": service},
            "Action": "sts:AssumeRole"
        }]
    }))
}

fn inline_policy(name: &str, actions: Value, resources: Value) -> Value {
    Value::map([
        ("PolicyName", Value::from(name)),
        (
            "PolicyDocument",
            Value::map([
                ("Version", Value::from("2012-10-17")),
                (
                    "Statement",
                    Value::list([Value::map([
                        ("Effect", Value::from("Allow")),
                        ("Action", actions),
                        ("Resource", resources),
                    ])]),
                ),
            ]),
        ),
    ])
}
