//! Configuration management for AWF.
//!
//! AWF reads an optional TOML file that points the tool at non-default
//! locations and binaries. Every field has a default, so most projects never
//! need a configuration file at all.
//!
//! # Lookup Order
//!
//! 1. An explicit path passed with `--config`
//! 2. The `AWF_CONFIG` environment variable
//! 3. `<project>/.github/aw/config.toml`
//! 4. Built-in defaults
//!
//! An explicitly named file must exist; the project file is optional.
//!
//! # File Format
//!
//! ```toml
//! github_host = "https://github.example.com"
//! gh_command = "/usr/local/bin/gh"
//! workflows_dir = ".github/workflows"
//! actions_lock = ".github/aw/actions-lock.json"
//! command_timeout_secs = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_ACTIONS_LOCK, DEFAULT_COMMAND_TIMEOUT, DEFAULT_GITHUB_HOST,
    DEFAULT_WORKFLOWS_DIR, PROJECT_CONFIG_PATH,
};
use crate::core::AwfError;

/// Tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwfConfig {
    /// Base URL of the GitHub host, used for `git ls-remote`.
    pub github_host: String,
    /// GitHub CLI binary.
    pub gh_command: String,
    /// Git binary.
    pub git_command: String,
    /// Workflow directory, relative to the project root.
    pub workflows_dir: PathBuf,
    /// Actions lock file, relative to the project root.
    pub actions_lock: PathBuf,
    /// Timeout for each `gh` or `git` subprocess.
    pub command_timeout_secs: u64,
}

impl Default for AwfConfig {
    fn default() -> Self {
        Self {
            github_host: DEFAULT_GITHUB_HOST.to_string(),
            gh_command: "gh".to_string(),
            git_command: "git".to_string(),
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            actions_lock: PathBuf::from(DEFAULT_ACTIONS_LOCK),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
        }
    }
}

impl AwfConfig {
    /// Load configuration following the documented lookup order.
    ///
    /// # Errors
    ///
    /// Returns [`AwfError::Config`] when an explicitly requested file is
    /// missing or any selected file fails to parse.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<Self, AwfError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
            && !env_path.is_empty()
        {
            return Self::load_from(Path::new(&env_path));
        }

        let project_file = project_root.join(PROJECT_CONFIG_PATH);
        if project_file.is_file() {
            return Self::load_from(&project_file);
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, AwfError> {
        let content = std::fs::read_to_string(path).map_err(|e| AwfError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| AwfError::Config {
            message: format!("invalid {}: {e}", path.display()),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Subprocess timeout as a [`Duration`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Absolute workflows directory for `project_root`.
    pub fn workflows_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.workflows_dir)
    }

    /// Absolute actions lock path for `project_root`.
    pub fn actions_lock_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.actions_lock)
    }
}
