//! Git fallback for enumerating release tags.
//!
//! When the GitHub API cannot be used (usually because `gh` is not
//! authenticated), tags and their commit digests are read directly from the
//! remote with `git ls-remote --tags`. Annotated tags appear twice in that
//! output: once for the tag object and once peeled (`refs/tags/v1^{}`) to the
//! commit. The peeled digest wins.

pub mod command_builder;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::AwfConfig;
use crate::core::AwfError;

pub use command_builder::GitCommand;

/// Source of `(tag, commit sha)` pairs for a repository.
#[async_trait]
pub trait GitFetcher: Send + Sync {
    /// List every tag of `repo` (`owner/name`) with its commit digest.
    async fn list_tags_with_shas(&self, repo: &str) -> Result<Vec<(String, String)>, AwfError>;
}

/// [`GitFetcher`] backed by `git ls-remote`.
#[derive(Debug, Clone)]
pub struct GitLsRemote {
    command: GitCommand,
    host: String,
}

impl GitLsRemote {
    /// Create a fetcher for `host` (e.g. `https://github.com`).
    pub fn new(command: GitCommand, host: impl Into<String>) -> Self {
        Self {
            command,
            host: host.into(),
        }
    }

    /// Create a fetcher from project configuration.
    pub fn from_config(config: &AwfConfig) -> Self {
        Self::new(
            GitCommand::new(&config.git_command).timeout(config.command_timeout()),
            &config.github_host,
        )
    }

    /// Clone URL of `repo` on the configured host.
    pub fn repo_url(&self, repo: &str) -> String {
        format!("{}/{}.git", self.host.trim_end_matches('/'), repo)
    }
}

#[async_trait]
impl GitFetcher for GitLsRemote {
    async fn list_tags_with_shas(&self, repo: &str) -> Result<Vec<(String, String)>, AwfError> {
        let url = self.repo_url(repo);
        let output = self.command.ls_remote_tags(&url).await?;
        let tags = parse_ls_remote_tags(&output.stdout_text());
        tracing::debug!(target: "git", "{} tags listed for {repo}", tags.len());
        Ok(tags)
    }
}

/// Parse `git ls-remote --tags` output into `(tag, sha)` pairs.
///
/// Order follows the first appearance of each tag. For annotated tags the
/// peeled `^{}` digest replaces the tag-object digest.
pub fn parse_ls_remote_tags(output: &str) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in output.lines() {
        let Some((sha, reference)) = line.split_once('\t') else {
            continue;
        };
        let Some(tag) = reference.trim().strip_prefix("refs/tags/") else {
            continue;
        };
        let (name, peeled) = match tag.strip_suffix("^{}") {
            Some(name) => (name, true),
            None => (tag, false),
        };
        let sha = sha.trim().to_string();

        match index.get(name) {
            Some(&i) => {
                if peeled {
                    tags[i].1 = sha;
                }
            }
            None => {
                index.insert(name.to_string(), tags.len());
                tags.push((name.to_string(), sha));
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";
    const C: &str = "3333333333333333333333333333333333333333";

    #[test]
    fn test_parse_prefers_peeled_digest() {
        let output = format!(
            "{A}\trefs/tags/v1\n{B}\trefs/tags/v2\n{C}\trefs/tags/v2^{{}}\n"
        );
        let tags = parse_ls_remote_tags(&output);
        assert_eq!(
            tags,
            vec![("v1".to_string(), A.to_string()), ("v2".to_string(), C.to_string())]
        );
    }

    #[test]
    fn test_parse_peeled_before_tag_object() {
        let output = format!("{C}\trefs/tags/v3^{{}}\n{B}\trefs/tags/v3\n");
        assert_eq!(parse_ls_remote_tags(&output), vec![("v3".to_string(), C.to_string())]);
    }

    #[test]
    fn test_parse_ignores_non_tag_lines() {
        let output = format!("{A}\tHEAD\n{B}\trefs/heads/main\nwarning: something\n");
        assert!(parse_ls_remote_tags(&output).is_empty());
    }

    #[test]
    fn test_repo_url() {
        let fetcher = GitLsRemote::new(GitCommand::default(), "https://github.com/");
        assert_eq!(fetcher.repo_url("actions/checkout"), "https://github.com/actions/checkout.git");
    }
}
