//! Common test utilities for AWF integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Programs that do not exist, so remote lookups fail fast and offline.
pub const OFFLINE_CONFIG: &str = "gh_command = \"awf-test-missing-gh\"\n\
                                  git_command = \"awf-test-missing-git\"\n\
                                  command_timeout_secs = 5\n";

/// A throwaway project with `.git` and `.github/workflows`.
pub struct TestProject {
    _temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// Create an empty project configured to never reach the network.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join(".git")).expect("create .git");
        fs::create_dir_all(root.join(".github/workflows")).expect("create workflows dir");
        let project = Self {
            _temp: temp,
            root,
        };
        project.write(".github/aw/config.toml", OFFLINE_CONFIG);
        project
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file relative to the project root.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        awf_cli::test_utils::write_file(&self.root, rel, content)
    }

    /// Write a workflow into `.github/workflows`.
    pub fn workflow(&self, name: &str, content: &str) -> PathBuf {
        self.write(&format!(".github/workflows/{name}"), content)
    }

    /// Read a file relative to the project root.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    /// `awf` invocation scoped to this project.
    pub fn awf(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("awf").expect("awf binary");
        cmd.current_dir(&self.root)
            .env_remove("AWF_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--project")
            .arg(&self.root)
            .args(args);
        cmd
    }
}
