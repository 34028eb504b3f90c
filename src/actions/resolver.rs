//! Release and digest lookup for pinned actions.

use std::collections::HashMap;

use crate::core::{AwfError, OperationContext};
use crate::git::GitFetcher;
use crate::github::RemoteFetcher;
use crate::version::VersionComparator;

use super::state::{UpdateState, UpdateTracker};
use super::{base_repo, is_commit_sha, is_core_action};

/// Which backend produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPath {
    /// Releases and tag refs through the GitHub API
    Api,
    /// Tags listed with `git ls-remote`
    GitFallback,
}

/// The release an action should move to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Action reference as pinned (may include a sub-path)
    pub repo: String,
    /// Version the lookup started from
    pub current: String,
    /// Chosen release tag
    pub version: String,
    /// 40-character commit digest of `version`
    pub sha: String,
    /// Backend that answered
    pub path: LookupPath,
    /// States the lookup went through, ending in `Resolved`
    pub history: Vec<UpdateState>,
}

/// Finds the newest compatible release of an action and its commit digest.
///
/// Results, failures included, are memoized per `"<repo>|<version>"` for the
/// lifetime of the resolver, so one update run queries each pin once no
/// matter how many workflows use it.
pub struct ActionVersionResolver<'a> {
    remote: &'a dyn RemoteFetcher,
    git: &'a dyn GitFetcher,
    cache: HashMap<String, Result<Resolution, AwfError>>,
}

impl<'a> ActionVersionResolver<'a> {
    /// Create a resolver over the API client and its git fallback.
    pub fn new(remote: &'a dyn RemoteFetcher, git: &'a dyn GitFetcher) -> Self {
        Self {
            remote,
            git,
            cache: HashMap::new(),
        }
    }

    /// Number of memoized lookups.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve the release `repo` pinned at `current` should move to.
    ///
    /// Core actions ignore `allow_major` and always consider every major.
    ///
    /// # Errors
    ///
    /// - [`AwfError::Cancelled`] when `ctx` is cancelled; never memoized
    /// - [`AwfError::ActionResolution`] when no valid release exists, the
    ///   digest is malformed, or both lookup paths fail
    pub async fn resolve(
        &mut self,
        ctx: &OperationContext,
        repo: &str,
        current: &str,
        allow_major: bool,
    ) -> Result<Resolution, AwfError> {
        let key = format!("{repo}|{current}");
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Using cached release lookup for {repo}@{current}");
            return cached.clone();
        }

        let result = self.lookup(ctx, repo, current, allow_major).await;
        if !matches!(result, Err(AwfError::Cancelled)) {
            self.cache.insert(key, result.clone());
        }
        result
    }

    async fn lookup(
        &self,
        ctx: &OperationContext,
        repo: &str,
        current: &str,
        allow_major: bool,
    ) -> Result<Resolution, AwfError> {
        let base = base_repo(repo);
        let allow_major = allow_major || is_core_action(repo);
        let mut tracker = UpdateTracker::new(format!("{repo}@{current}"));
        let fail = |tracker: &mut UpdateTracker, reason: String| {
            tracker.advance(UpdateState::Failed);
            AwfError::ActionResolution {
                repo: repo.to_string(),
                version: current.to_string(),
                reason,
            }
        };

        ctx.checkpoint()?;
        tracker.advance(UpdateState::Querying);
        let (version, sha, path) = match self.remote.fetch_releases(base).await {
            Ok(releases) => {
                let Some(tag) = VersionComparator::select_release(current, &releases, allow_major)
                else {
                    return Err(fail(&mut tracker, no_release_reason(current, allow_major)));
                };
                tracker.advance(UpdateState::Resolved);
                ctx.checkpoint()?;
                let sha = match self.remote.resolve_tag_sha(base, tag).await {
                    Ok(sha) => sha,
                    Err(AwfError::Cancelled) => return Err(AwfError::Cancelled),
                    Err(e) => return Err(fail(&mut tracker, format!("tag {tag}: {e}"))),
                };
                (tag.to_string(), sha, LookupPath::Api)
            }
            Err(AwfError::Auth {
                subsystem,
            }) => {
                tracing::info!(
                    "Authentication failed for {subsystem}; listing tags of {base} with git"
                );
                tracker.advance(UpdateState::FallingBack);
                ctx.checkpoint()?;
                let tags = match self.git.list_tags_with_shas(base).await {
                    Ok(tags) => tags,
                    Err(AwfError::Cancelled) => return Err(AwfError::Cancelled),
                    Err(e) => {
                        let reason = format!("authentication failed for {subsystem}; git: {e}");
                        return Err(fail(&mut tracker, reason));
                    }
                };
                let names: Vec<&str> = tags.iter().map(|(name, _)| name.as_str()).collect();
                let Some(tag) = VersionComparator::select_release(current, &names, allow_major)
                else {
                    return Err(fail(&mut tracker, no_release_reason(current, allow_major)));
                };
                let sha = tags
                    .iter()
                    .find(|(name, _)| name == tag)
                    .map(|(_, sha)| sha.clone())
                    .unwrap_or_default();
                tracker.advance(UpdateState::Resolved);
                (tag.to_string(), sha, LookupPath::GitFallback)
            }
            Err(AwfError::Cancelled) => return Err(AwfError::Cancelled),
            Err(e) => return Err(fail(&mut tracker, e.to_string())),
        };

        if !is_commit_sha(&sha) {
            let reason = format!("tag {version} resolved to invalid digest '{sha}'");
            return Err(fail(&mut tracker, reason));
        }

        tracing::debug!("{repo}@{current} resolves to {version} ({sha})");
        Ok(Resolution {
            repo: repo.to_string(),
            current: current.to_string(),
            version,
            sha,
            path,
            history: tracker.history().to_vec(),
        })
    }
}

fn no_release_reason(current: &str, allow_major: bool) -> String {
    match crate::version::ActionVersion::parse(current) {
        Some(version) if !allow_major => {
            format!("no valid release tags for major version v{}", version.major)
        }
        _ => "no valid release tags".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockGitFetcher, MockRemoteFetcher};

    const SHA_1: &str = "1111111111111111111111111111111111111111";
    const SHA_2: &str = "2222222222222222222222222222222222222222";

    fn api_with(repo: &str, releases: &[&str]) -> MockRemoteFetcher {
        releases.iter().fold(MockRemoteFetcher::new().with_releases(repo, releases), |mock, tag| {
            mock.with_tag_sha(repo, tag, SHA_1)
        })
    }

    #[tokio::test]
    async fn test_stays_within_major() {
        let remote = api_with("foo/bar", &["v4", "v5", "v5.0.0", "v5.0.1", "v6"])
            .with_tag_sha("foo/bar", "v5.0.1", SHA_2);
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let ctx = OperationContext::new();

        let resolution = resolver.resolve(&ctx, "foo/bar", "v5.0.0", false).await.unwrap();
        assert_eq!(resolution.version, "v5.0.1");
        assert_eq!(resolution.sha, SHA_2);
        assert_eq!(resolution.path, LookupPath::Api);
        assert_eq!(
            resolution.history,
            vec![UpdateState::Idle, UpdateState::Querying, UpdateState::Resolved]
        );

        let major = resolver.resolve(&ctx, "foo/bar", "v4", true).await.unwrap();
        assert_eq!(major.version, "v6");
    }

    #[tokio::test]
    async fn test_prefers_major_tag_on_tie() {
        let remote = api_with("foo/bar", &["v8", "v8.0.0"]);
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let resolution =
            resolver.resolve(&OperationContext::new(), "foo/bar", "v8", false).await.unwrap();
        assert_eq!(resolution.version, "v8");
    }

    #[tokio::test]
    async fn test_core_actions_cross_majors_and_use_base_repo() {
        let remote = api_with("actions/cache", &["v3", "v4", "v4.2.0"]);
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let resolution = resolver
            .resolve(&OperationContext::new(), "actions/cache/restore", "v3", false)
            .await
            .unwrap();
        assert_eq!(resolution.version, "v4.2.0");
        assert_eq!(resolution.repo, "actions/cache/restore");
    }

    #[tokio::test]
    async fn test_auth_failure_falls_back_to_git() {
        let remote = MockRemoteFetcher::new().with_release_error(
            "foo/bar",
            AwfError::Auth {
                subsystem: "github api".to_string(),
            },
        );
        let git = MockGitFetcher::new()
            .with_tags("foo/bar", &[("v1.0.0", SHA_1), ("v1.1.0", SHA_2), ("latest", SHA_1)]);
        let mut resolver = ActionVersionResolver::new(&remote, &git);

        let resolution =
            resolver.resolve(&OperationContext::new(), "foo/bar", "v1.0.0", false).await.unwrap();
        assert_eq!(resolution.version, "v1.1.0");
        assert_eq!(resolution.sha, SHA_2);
        assert_eq!(resolution.path, LookupPath::GitFallback);
        assert!(resolution.history.contains(&UpdateState::FallingBack));
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let remote = MockRemoteFetcher::new().with_releases("foo/bar", &["nightly"]);
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let ctx = OperationContext::new();

        let first = resolver.resolve(&ctx, "foo/bar", "v1", false).await.unwrap_err();
        assert!(matches!(first, AwfError::ActionResolution { .. }));
        assert!(resolver.resolve(&ctx, "foo/bar", "v1", false).await.is_err());
        assert_eq!(remote.release_calls(), 1);
        assert_eq!(resolver.cached(), 1);
    }

    #[tokio::test]
    async fn test_both_paths_failing() {
        let remote = MockRemoteFetcher::new().with_release_error(
            "foo/bar",
            AwfError::Auth {
                subsystem: "github api".to_string(),
            },
        );
        let git = MockGitFetcher::new().with_error(
            "foo/bar",
            AwfError::Fetch {
                reference: "foo/bar".to_string(),
                reason: "network down".to_string(),
            },
        );
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let err =
            resolver.resolve(&OperationContext::new(), "foo/bar", "v1", false).await.unwrap_err();
        assert!(err.to_string().contains("network down"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_digest() {
        let remote = MockRemoteFetcher::new()
            .with_releases("foo/bar", &["v1"])
            .with_tag_sha("foo/bar", "v1", "abc123");
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let err =
            resolver.resolve(&OperationContext::new(), "foo/bar", "v1", false).await.unwrap_err();
        assert!(err.to_string().contains("invalid digest"));
    }

    #[tokio::test]
    async fn test_cancellation_is_not_cached() {
        let remote = api_with("foo/bar", &["v1"]);
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let ctx = OperationContext::new();
        ctx.cancel();
        let err = resolver.resolve(&ctx, "foo/bar", "v1", false).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(resolver.cached(), 0);
    }
}
