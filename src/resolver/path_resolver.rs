//! Materialization of import references into readable files.
//!
//! Local references resolve against the importing file's directory. Remote
//! workflowspecs are fetched through a [`RemoteFetcher`] into a temporary
//! directory owned by the resolver, and the materialized path is cached by
//! `(owner, repo, ref, path)` for the rest of the invocation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::constants::LOCK_FILE_SUFFIX;
use crate::core::{AwfError, OperationContext};
use crate::github::RemoteFetcher;
use crate::resolver::import_spec::WorkflowSpec;
use crate::utils::path_validation::join_within_base;

/// Location of an import reference in its parent document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    /// Parent document (display path)
    pub file: String,
    /// 1-based line of the reference
    pub line: usize,
    /// 1-based column of the reference
    pub column: usize,
}

/// Cache key for remote fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RemoteKey {
    owner: String,
    repo: String,
    git_ref: String,
    path: String,
}

/// Resolves import references to files on disk.
pub struct PathResolver {
    fetcher: Arc<dyn RemoteFetcher>,
    cache: HashMap<RemoteKey, PathBuf>,
    staging: Option<TempDir>,
    fetch_count: usize,
}

impl PathResolver {
    /// Create a resolver using `fetcher` for remote references.
    pub fn new(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
            staging: None,
            fetch_count: 0,
        }
    }

    /// Number of remote fetches performed (cache hits excluded).
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Resolve a local reference against `base_dir`.
    ///
    /// # Errors
    ///
    /// [`AwfError::LockFileImport`] for compiled `.lock.yml` outputs and
    /// [`AwfError::NotFound`] when the file does not exist.
    pub fn resolve_local(
        &self,
        reference: &str,
        path: &str,
        base_dir: &Path,
        site: &ImportSite,
    ) -> Result<PathBuf, AwfError> {
        reject_lock_file(reference, path, site)?;
        let candidate = base_dir.join(path);
        if !candidate.is_file() {
            return Err(AwfError::NotFound {
                reference: path.to_string(),
            });
        }
        candidate.canonicalize().map_err(|e| AwfError::fs("resolve", &candidate, &e))
    }

    /// Fetch (or reuse) the file named by a workflowspec.
    ///
    /// # Errors
    ///
    /// [`AwfError::PathEscape`] when the path climbs out of the repository,
    /// [`AwfError::LockFileImport`], the fetcher's `NotFound`, `Forbidden`,
    /// `Auth` or `Fetch` errors, and [`AwfError::Cancelled`].
    pub async fn resolve_remote(
        &mut self,
        reference: &str,
        spec: &WorkflowSpec,
        site: &ImportSite,
        ctx: &OperationContext,
    ) -> Result<PathBuf, AwfError> {
        reject_lock_file(reference, &spec.path, site)?;
        let repo_path =
            join_within_base("", &spec.path).map_err(|_| AwfError::PathEscape {
                path: spec.path.clone(),
                base_path: format!("{}/{}", spec.owner, spec.repo),
            })?;

        let key = RemoteKey {
            owner: spec.owner.clone(),
            repo: spec.repo.clone(),
            git_ref: spec.git_ref.clone(),
            path: repo_path.clone(),
        };
        if let Some(path) = self.cache.get(&key) {
            tracing::debug!(target: "resolver", "Cache hit for {spec}");
            return Ok(path.clone());
        }

        ctx.checkpoint()?;
        tracing::debug!(target: "resolver", "Fetching {spec}");
        let bytes =
            self.fetcher.fetch_file(&spec.owner, &spec.repo, &spec.git_ref, &repo_path).await?;
        self.fetch_count += 1;

        let target = self
            .staging_dir()?
            .join(&spec.owner)
            .join(&spec.repo)
            .join(sanitize_ref(&spec.git_ref))
            .join(&repo_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AwfError::fs("create directory", parent, &e))?;
        }
        std::fs::write(&target, &bytes).map_err(|e| AwfError::fs("write", &target, &e))?;

        self.cache.insert(key, target.clone());
        Ok(target)
    }

    fn staging_dir(&mut self) -> Result<PathBuf, AwfError> {
        if let Some(dir) = &self.staging {
            return Ok(dir.path().to_path_buf());
        }
        let dir = tempfile::Builder::new()
            .prefix("awf-imports-")
            .tempdir()
            .map_err(|e| AwfError::fs("create temporary directory", std::env::temp_dir(), &e))?;
        let path = dir.path().to_path_buf();
        self.staging = Some(dir);
        Ok(path)
    }
}

fn reject_lock_file(reference: &str, path: &str, site: &ImportSite) -> Result<(), AwfError> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    if file_name.to_lowercase().ends_with(LOCK_FILE_SUFFIX) {
        return Err(AwfError::LockFileImport {
            reference: reference.to_string(),
            file: site.file.clone(),
            line: site.line,
        });
    }
    Ok(())
}

/// Ref as a single directory name.
fn sanitize_ref(git_ref: &str) -> String {
    let name = git_ref.replace(['/', '\\', ':'], "_");
    if name.chars().all(|c| c == '.') { name.replace('.', "_") } else { name }
}
