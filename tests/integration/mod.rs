//! Integration test suite for stacksynth
//!
//! End-to-end tests over the public API and the `stacksynth` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **synthesis**: resolution order, outputs, failures, parallel vs sequential
//! - **determinism**: byte-stable output and construction-order independence
//! - **naming_and_tags**: physical names, collisions, tag precedence
//! - **definition**: stack files in YAML and JSON
//! - **blueprint**: the built-in secure web application
//! - **cli**: the binary, flags, settings file and exit codes
//! - **properties**: generated acyclic stacks (proptest)

#[path = "../common/mod.rs"]
mod common;

mod blueprint;
mod cli;
mod definition;
mod determinism;
mod naming_and_tags;
mod properties;
mod synthesis;
