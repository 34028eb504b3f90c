//! Git command builder.
//!
//! Wraps [`HostCommand`] with the git program configured for the project,
//! non-interactive environment settings and git-specific error
//! classification.

use std::time::Duration;

use crate::constants::DEFAULT_COMMAND_TIMEOUT;
use crate::core::AwfError;
use crate::utils::process::{CommandFailure, CommandOutput, HostCommand};

/// Builder for git invocations.
///
/// # Examples
///
/// ```rust,ignore
/// use awf_cli::git::command_builder::GitCommand;
///
/// # async fn example() -> Result<(), awf_cli::core::AwfError> {
/// let output = GitCommand::new("git")
///     .ls_remote_tags("https://github.com/actions/checkout.git")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
    timeout_duration: Duration,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommand {
    /// Create a builder that runs `program` (usually `git`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout_duration: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the command timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Base command with prompts disabled so auth failures surface as errors.
    pub fn command(&self) -> HostCommand {
        HostCommand::new(&self.program)
            .timeout(self.timeout_duration)
            .env("GIT_TERMINAL_PROMPT", "0")
    }

    /// Run `git ls-remote --tags <url>`.
    pub async fn ls_remote_tags(&self, url: &str) -> Result<CommandOutput, AwfError> {
        self.command()
            .args(["ls-remote", "--tags", url])
            .with_context(format!("listing tags of {url}"))
            .execute()
            .await
            .map_err(|failure| classify_git_failure(&failure, url))
    }
}

/// Map a failed git invocation onto the error taxonomy.
pub fn classify_git_failure(failure: &CommandFailure, reference: &str) -> AwfError {
    match failure {
        CommandFailure::Spawn {
            program,
            reason,
        } => AwfError::Fetch {
            reference: reference.to_string(),
            reason: format!("{program} is not installed or not in PATH ({reason})"),
        },
        CommandFailure::TimedOut {
            ..
        } => AwfError::Fetch {
            reference: reference.to_string(),
            reason: failure.to_string(),
        },
        CommandFailure::Exit {
            stderr,
            ..
        } => {
            let lower = stderr.to_lowercase();
            if lower.contains("authentication failed")
                || lower.contains("could not read username")
                || lower.contains("terminal prompts disabled")
                || lower.contains("permission denied (publickey)")
            {
                AwfError::Auth {
                    subsystem: "git".to_string(),
                }
            } else if lower.contains("repository not found") || lower.contains("not found") {
                AwfError::NotFound {
                    reference: reference.to_string(),
                }
            } else if lower.contains("403") {
                AwfError::Forbidden {
                    reference: reference.to_string(),
                }
            } else {
                AwfError::Fetch {
                    reference: reference.to_string(),
                    reason: stderr.trim().to_string(),
                }
            }
        }
    }
}
