//! Remote access to GitHub through the host `gh` CLI.
//!
//! The resolver and the action updater only see the [`RemoteFetcher`] trait,
//! which keeps them testable without the network. [`GhCli`] is the production
//! implementation: every call is a `gh api` subprocess whose stderr is
//! classified into not-found, forbidden and auth failures.

use async_trait::async_trait;

use crate::config::AwfConfig;
use crate::constants::DEFAULT_GITHUB_HOST;
use crate::core::AwfError;
use crate::utils::process::{CommandFailure, HostCommand};

/// Subsystem name used in auth errors raised by the API path.
pub const API_SUBSYSTEM: &str = "github api";

/// Remote operations against GitHub.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Tag names of all releases of `repo` (`owner/name`).
    async fn fetch_releases(&self, repo: &str) -> Result<Vec<String>, AwfError>;

    /// Commit digest the tag `tag` of `repo` points at.
    ///
    /// Annotated tags are dereferenced to their commit.
    async fn resolve_tag_sha(&self, repo: &str, tag: &str) -> Result<String, AwfError>;

    /// Raw bytes of `path` in `owner/repo` at `git_ref`.
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, AwfError>;
}

/// [`RemoteFetcher`] backed by `gh api`.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    host: Option<String>,
    timeout: std::time::Duration,
}

impl GhCli {
    /// Create a client running `program` against the default host.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            host: None,
            timeout: crate::constants::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Create a client from project configuration.
    ///
    /// Non-default hosts are passed to `gh` through `GH_HOST`.
    pub fn from_config(config: &AwfConfig) -> Self {
        let host = (config.github_host.trim_end_matches('/') != DEFAULT_GITHUB_HOST).then(|| {
            config
                .github_host
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        });
        Self {
            program: config.gh_command.clone(),
            host,
            timeout: config.command_timeout(),
        }
    }

    fn api(&self, endpoint: &str) -> HostCommand {
        let mut cmd = HostCommand::new(&self.program).timeout(self.timeout).args(["api", endpoint]);
        if let Some(host) = &self.host {
            cmd = cmd.env("GH_HOST", host);
        }
        cmd
    }

    async fn run(&self, cmd: HostCommand, reference: &str) -> Result<String, AwfError> {
        let output = cmd
            .with_context(reference.to_string())
            .execute()
            .await
            .map_err(|failure| classify_gh_failure(&failure, reference))?;
        Ok(output.stdout_text())
    }
}

#[async_trait]
impl RemoteFetcher for GhCli {
    async fn fetch_releases(&self, repo: &str) -> Result<Vec<String>, AwfError> {
        let cmd = self
            .api(&format!("repos/{repo}/releases"))
            .args(["--paginate", "--jq", ".[].tag_name"]);
        let stdout = self.run(cmd, repo).await?;
        Ok(parse_lines(&stdout))
    }

    async fn resolve_tag_sha(&self, repo: &str, tag: &str) -> Result<String, AwfError> {
        let reference = format!("{repo}@{tag}");
        let cmd = self
            .api(&format!("repos/{repo}/git/ref/tags/{tag}"))
            .args(["--jq", r#".object.sha + " " + .object.type"#]);
        let stdout = self.run(cmd, &reference).await?;
        let (sha, object_type) = parse_ref_object(&stdout).ok_or_else(|| AwfError::Fetch {
            reference: reference.clone(),
            reason: format!("unexpected tag reference response: {}", stdout.trim()),
        })?;

        if object_type != "tag" {
            return Ok(sha);
        }

        tracing::debug!(target: "github", "Dereferencing annotated tag {reference}");
        let cmd = self
            .api(&format!("repos/{repo}/git/tags/{sha}"))
            .args(["--jq", ".object.sha"]);
        let stdout = self.run(cmd, &reference).await?;
        Ok(stdout.trim().to_string())
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, AwfError> {
        let reference = format!("{owner}/{repo}/{path}@{git_ref}");
        let cmd = self
            .api(&format!("repos/{owner}/{repo}/contents/{path}?ref={git_ref}"))
            .args(["-H", "Accept: application/vnd.github.raw"]);
        let output = cmd
            .with_context(reference.clone())
            .execute()
            .await
            .map_err(|failure| classify_gh_failure(&failure, &reference))?;
        Ok(output.stdout)
    }
}

/// Map a failed `gh` invocation onto the error taxonomy.
///
/// A missing `gh` binary counts as an auth failure so callers with a git
/// fallback can still proceed.
pub fn classify_gh_failure(failure: &CommandFailure, reference: &str) -> AwfError {
    match failure {
        CommandFailure::Spawn {
            ..
        } => AwfError::Auth {
            subsystem: format!("{API_SUBSYSTEM} (gh unavailable)"),
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
            if lower.contains("http 401")
                || lower.contains("gh auth login")
                || lower.contains("gh_token")
                || lower.contains("authentication")
            {
                AwfError::Auth {
                    subsystem: API_SUBSYSTEM.to_string(),
                }
            } else if lower.contains("http 404") || lower.contains("not found") {
                AwfError::NotFound {
                    reference: reference.to_string(),
                }
            } else if lower.contains("http 403") || lower.contains("forbidden") {
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

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
}

/// Parse `"<sha> <type>"` produced by the tag reference query.
fn parse_ref_object(stdout: &str) -> Option<(String, String)> {
    let mut parts = stdout.split_whitespace();
    let sha = parts.next()?;
    let object_type = parts.next().unwrap_or("commit");
    Some((sha.to_string(), object_type.to_string()))
}
