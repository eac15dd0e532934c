//! stacksynth - resource graph builder and template synthesizer
//!
//! stacksynth composes a declarative cloud stack out of typed resource nodes whose
//! properties may refer to attributes of other nodes that do not exist yet (an ARN, an
//! id, a generated name). Synthesis orders the nodes by their references, resolves every
//! deferred value in that order, and writes a deployment template that is byte-for-byte
//! identical for identical input.
//!
//! # Architecture Overview
//!
//! ```text
//! StackDefinition ──► Stack ──► DependencyGraph ──► levels ──► ReferenceResolver ──► Template
//!   (YAML/JSON)         │            (cycles)                        ▲
//!                       │                                            │
//!                 EnvironmentContext ──► TagPropagator, NamingConvention, producers
//! ```
//!
//! ## Key Properties
//!
//! - **Deterministic**: every map is ordered, ties in topological order break by logical
//!   id, and derived ids come from SHA-256 digests, never from clocks or randomness
//! - **Order independent**: registering nodes in a different order yields the same bytes
//! - **All or nothing**: any failure aborts synthesis without a partial template
//! - **Parallel**: nodes of one dependency level resolve concurrently
//!
//! # Core Modules
//!
//! - [`core`] - resource kinds with their schemas, error types
//! - [`stack`] - values, references, nodes, stacks and the file format
//! - [`config`] - environment context and settings file
//! - [`resolver`] - dependency graph, attribute producers, reference resolution
//! - [`synth`] - tags, naming, the template document and the synthesizer
//! - [`blueprint`] - the built-in secure web application stack
//! - [`cli`] - the `stacksynth` command line
//!
//! # Stack File Format
//!
//! ```yaml
//! name: Demo
//! resources:
//!   key:
//!     type: key
//!     properties:
//!       KeyPolicy: { Version: "2012-10-17" }
//!   bucket:
//!     type: bucket
//!     properties:
//!       KmsMasterKeyId: { "Fn::GetAtt": [key, arn] }
//! outputs:
//!   BucketArn:
//!     value: { "Fn::GetAtt": [bucket, arn] }
//!     exportName: demo-bucket-arn
//! ```
//!
//! # Settings File Format
//!
//! ```toml
//! [environment]
//! suffix = "staging"
//! account = "123456789012"
//! region = "us-east-1"
//!
//! [tags]
//! CostCenter = "platform"
//!
//! [naming]
//! prefix = "acme"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! stacksynth synth --stack stack.yaml --format yaml
//! stacksynth synth -c environmentSuffix=pr42 --output template.json
//! stacksynth graph --stack stack.yaml --format levels
//! ```

pub mod blueprint;
pub mod cli;
pub mod config;
pub mod core;
pub mod resolver;
pub mod stack;
pub mod synth;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
