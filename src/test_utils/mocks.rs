//! In-memory [`RemoteFetcher`] and [`GitFetcher`] implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::AwfError;
use crate::git::GitFetcher;
use crate::github::RemoteFetcher;

/// Remote fetcher answering from registered files, releases and tags.
///
/// Unregistered lookups fail with [`AwfError::NotFound`].
#[derive(Debug, Default)]
pub struct MockRemoteFetcher {
    files: HashMap<String, Vec<u8>>,
    releases: HashMap<String, Result<Vec<String>, AwfError>>,
    tag_shas: HashMap<String, String>,
    file_calls: AtomicUsize,
    release_calls: AtomicUsize,
}

impl MockRemoteFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `owner/repo/path@git_ref`.
    pub fn with_file(
        mut self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
        content: &str,
    ) -> Self {
        self.files.insert(file_key(owner, repo, git_ref, path), content.as_bytes().to_vec());
        self
    }

    /// List `tags` as the releases of `repo`.
    pub fn with_releases(mut self, repo: &str, tags: &[&str]) -> Self {
        let tags = tags.iter().map(|t| (*t).to_string()).collect();
        self.releases.insert(repo.to_string(), Ok(tags));
        self
    }

    /// Fail release listing of `repo` with `error`.
    pub fn with_release_error(mut self, repo: &str, error: AwfError) -> Self {
        self.releases.insert(repo.to_string(), Err(error));
        self
    }

    /// Resolve `repo@tag` to `sha`.
    pub fn with_tag_sha(mut self, repo: &str, tag: &str, sha: &str) -> Self {
        self.tag_shas.insert(format!("{repo}@{tag}"), sha.to_string());
        self
    }

    /// Number of `fetch_file` calls so far.
    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_releases` calls so far.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

fn file_key(owner: &str, repo: &str, git_ref: &str, path: &str) -> String {
    format!("{owner}/{repo}/{path}@{git_ref}")
}

#[async_trait]
impl RemoteFetcher for MockRemoteFetcher {
    async fn fetch_releases(&self, repo: &str) -> Result<Vec<String>, AwfError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.releases.get(repo).cloned().unwrap_or_else(|| {
            Err(AwfError::NotFound {
                reference: repo.to_string(),
            })
        })
    }

    async fn resolve_tag_sha(&self, repo: &str, tag: &str) -> Result<String, AwfError> {
        let reference = format!("{repo}@{tag}");
        self.tag_shas.get(&reference).cloned().ok_or(AwfError::NotFound {
            reference,
        })
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, AwfError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        let key = file_key(owner, repo, git_ref, path);
        self.files.get(&key).cloned().ok_or(AwfError::NotFound {
            reference: key,
        })
    }
}

/// Git fetcher answering from registered tag lists.
#[derive(Debug, Default)]
pub struct MockGitFetcher {
    tags: HashMap<String, Result<Vec<(String, String)>, AwfError>>,
    calls: AtomicUsize,
}

impl MockGitFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// List `(tag, sha)` pairs for `repo`.
    pub fn with_tags(mut self, repo: &str, tags: &[(&str, &str)]) -> Self {
        let tags = tags.iter().map(|(t, s)| ((*t).to_string(), (*s).to_string())).collect();
        self.tags.insert(repo.to_string(), Ok(tags));
        self
    }

    /// Fail tag listing of `repo` with `error`.
    pub fn with_error(mut self, repo: &str, error: AwfError) -> Self {
        self.tags.insert(repo.to_string(), Err(error));
        self
    }

    /// Number of `list_tags_with_shas` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitFetcher for MockGitFetcher {
    async fn list_tags_with_shas(&self, repo: &str) -> Result<Vec<(String, String)>, AwfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tags.get(repo).cloned().unwrap_or_else(|| {
            Err(AwfError::NotFound {
                reference: repo.to_string(),
            })
        })
    }
}
