//! Common test utilities for stacksynth integration tests

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables the binary reads; cleared so the host cannot leak in.
const ENV_VARS: [&str; 6] = [
    "STACKSYNTH_CONFIG",
    "ENVIRONMENT_SUFFIX",
    "REPOSITORY",
    "COMMIT_AUTHOR",
    "CDK_DEFAULT_ACCOUNT",
    "CDK_DEFAULT_REGION",
];

/// A temporary working directory for driving the `stacksynth` binary.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        Ok(Self {
            temp_dir,
        })
    }

    /// Project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {relative}"))?;
        Ok(path)
    }

    /// Read `relative` back.
    pub fn read_file(&self, relative: &str) -> Result<String> {
        fs::read_to_string(self.path().join(relative))
            .with_context(|| format!("Failed to read {relative}"))
    }

    /// `stacksynth` running in the project directory with a clean environment.
    pub fn stacksynth(&self) -> Command {
        let mut cmd = Command::cargo_bin("stacksynth").expect("binary is built for tests");
        cmd.current_dir(self.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}

/// Parse a JSON template.
pub fn parse_json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).expect("template is valid JSON")
}
