//! Shared state and helpers for CLI commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::AwfConfig;
use crate::core::AwfError;
use crate::git::GitLsRemote;
use crate::github::GhCli;
use crate::utils::fs::{find_project_root, list_workflow_files};

/// Project root and configuration shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Root of the project being operated on
    pub project_root: PathBuf,
    /// Effective configuration
    pub config: AwfConfig,
}

impl CommandContext {
    /// Locate the project and load its configuration.
    ///
    /// An explicit `project` is used as-is; otherwise the nearest ancestor of
    /// the current directory containing `.git` or `.github` is the root.
    pub fn load(project: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let project_root = match project {
            Some(dir) => dir.to_path_buf(),
            None => {
                let cwd = std::env::current_dir().context("Cannot determine current directory")?;
                find_project_root(&cwd)
            }
        };
        let config = AwfConfig::load(config, &project_root)?;
        Ok(Self {
            project_root,
            config,
        })
    }

    /// Directory holding the workflow markdown files.
    pub fn workflows_dir(&self) -> PathBuf {
        self.config.workflows_path(&self.project_root)
    }

    /// Path of the actions lock file.
    pub fn actions_lock(&self) -> PathBuf {
        self.config.actions_lock_path(&self.project_root)
    }

    /// GitHub API client for this project.
    pub fn remote(&self) -> GhCli {
        GhCli::from_config(&self.config)
    }

    /// Git tag lister for this project.
    pub fn git(&self) -> GitLsRemote {
        GitLsRemote::from_config(&self.config)
    }

    /// Workflow files named on the command line, or every workflow when none
    /// are given.
    pub fn workflow_files(&self, names: &[String]) -> Result<Vec<PathBuf>, AwfError> {
        if names.is_empty() {
            return list_workflow_files(&self.workflows_dir());
        }
        names.iter().map(|name| self.locate_workflow(name)).collect()
    }

    /// Find a workflow by path or by name inside the workflows directory.
    ///
    /// `triage`, `triage.md`, `.github/workflows/triage.md` and an absolute
    /// path all name the same file.
    pub fn locate_workflow(&self, name: &str) -> Result<PathBuf, AwfError> {
        let workflows = self.workflows_dir();
        let candidates = [
            PathBuf::from(name),
            self.project_root.join(name),
            workflows.join(name),
            workflows.join(format!("{name}.md")),
        ];
        candidates.into_iter().find(|path| path.is_file()).ok_or_else(|| AwfError::NotFound {
            reference: name.to_string(),
        })
    }

    /// `path` relative to the project root when it lies inside it.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root).unwrap_or(path).display().to_string()
    }
}
