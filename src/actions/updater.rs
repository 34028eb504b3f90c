//! Batch update of the actions lock file and the workflows pinning it.

use std::path::{Path, PathBuf};

use crate::core::{AwfError, OperationContext};
use crate::lockfile::{ActionLockEntry, ActionLockFile};
use crate::utils::fs::{list_workflow_files, read_text, safe_write};

use super::resolver::ActionVersionResolver;
use super::rewrite::rewrite_uses;
use super::state::{UpdateState, UpdateTracker};

/// One lock entry that moved to a new release or digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionChange {
    /// Action repository
    pub repo: String,
    /// Version pinned before the update
    pub from_version: String,
    /// Version pinned after the update
    pub to_version: String,
    /// Digest before the update
    pub old_sha: String,
    /// Digest after the update
    pub new_sha: String,
}

/// Summary of a lock file update.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Entries that were replaced
    pub updated: Vec<ActionChange>,
    /// Keys of entries already at the resolved digest
    pub up_to_date: Vec<String>,
    /// Keys of entries that could not be checked, with the reason
    pub failed: Vec<(String, AwfError)>,
}

impl UpdateReport {
    /// Whether the lock file was modified.
    pub fn has_changes(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Resolve every entry of `lock` and replace the ones whose digest moved.
///
/// A failure for one action is recorded in the report and the batch goes on.
///
/// # Errors
///
/// Only [`AwfError::Cancelled`]; the lock file keeps the entries updated
/// before cancellation and the caller decides whether to save it.
pub async fn update_lock_file(
    resolver: &mut ActionVersionResolver<'_>,
    ctx: &OperationContext,
    lock: &mut ActionLockFile,
    allow_major: bool,
) -> Result<UpdateReport, AwfError> {
    let mut report = UpdateReport::default();
    let entries: Vec<ActionLockEntry> = lock.iter().cloned().collect();

    for entry in entries {
        ctx.checkpoint()?;
        let key = entry.key();
        let resolved = resolver.resolve(ctx, &entry.repo, &entry.version, allow_major).await;
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(AwfError::Cancelled) => return Err(AwfError::Cancelled),
            Err(e) => {
                tracing::warn!("Failed to check {key}: {e}");
                report.failed.push((key, e));
                continue;
            }
        };

        let mut tracker = UpdateTracker::new(key.clone());
        for state in resolution.history.iter().skip(1) {
            tracker.advance(*state);
        }

        if resolution.sha == entry.sha {
            tracker.advance(UpdateState::Skipped);
            report.up_to_date.push(key);
            continue;
        }

        tracker.advance(UpdateState::Applied);
        tracing::info!("Updating {key} to {}@{}", resolution.version, resolution.sha);
        lock.remove(&entry.repo, &entry.version);
        lock.insert(ActionLockEntry::new(&entry.repo, &resolution.version, &resolution.sha));
        report.updated.push(ActionChange {
            repo: entry.repo,
            from_version: entry.version,
            to_version: resolution.version,
            old_sha: entry.sha,
            new_sha: resolution.sha,
        });
    }

    Ok(report)
}

/// Rewrite `uses:` lines in every workflow under `dir` according to `changes`.
///
/// Returns the files that were rewritten. A missing directory has nothing
/// to rewrite.
///
/// # Errors
///
/// Fails when a workflow cannot be read or written.
pub fn update_workflow_files(
    dir: &Path,
    changes: &[ActionChange],
) -> Result<Vec<PathBuf>, AwfError> {
    if changes.is_empty() || !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut rewritten = Vec::new();
    for path in list_workflow_files(dir)? {
        let content = read_text(&path)?;
        if let Some(updated) = rewrite_uses(&content, changes) {
            safe_write(&path, &updated)?;
            tracing::debug!("Updated action references in {}", path.display());
            rewritten.push(path);
        }
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockGitFetcher, MockRemoteFetcher, write_file};
    use tempfile::TempDir;

    const OLD: &str = "0000000000000000000000000000000000000000";
    const SHA_1: &str = "1111111111111111111111111111111111111111";
    const SHA_2: &str = "2222222222222222222222222222222222222222";

    fn lock_with(entries: &[(&str, &str, &str)]) -> ActionLockFile {
        let mut lock = ActionLockFile::new();
        for (repo, version, sha) in entries {
            lock.insert(ActionLockEntry::new(*repo, *version, *sha));
        }
        lock
    }

    #[tokio::test]
    async fn test_batch_reports_each_outcome() {
        let remote = MockRemoteFetcher::new()
            .with_releases("foo/bar", &["v4", "v5", "v5.0.0", "v5.0.1", "v6"])
            .with_tag_sha("foo/bar", "v5.0.1", SHA_1)
            .with_releases("foo/same", &["v2"])
            .with_tag_sha("foo/same", "v2", SHA_2)
            .with_release_error(
                "foo/broken",
                AwfError::NotFound {
                    reference: "foo/broken".to_string(),
                },
            );
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let mut lock = lock_with(&[
            ("foo/bar", "v5.0.0", "old"),
            ("foo/same", "v2", SHA_2),
            ("foo/broken", "v1", OLD),
        ]);

        let report = update_lock_file(&mut resolver, &OperationContext::new(), &mut lock, false)
            .await
            .unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].to_version, "v5.0.1");
        assert_eq!(report.up_to_date, vec!["foo/same@v2".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "foo/broken@v1");

        assert!(lock.get("foo/bar", "v5.0.0").is_none());
        assert_eq!(lock.get("foo/bar", "v5.0.1").unwrap().sha, SHA_1);
        assert!(lock.get("foo/broken", "v1").is_some());
        lock.validate().unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_batch() {
        let remote = MockRemoteFetcher::new();
        let git = MockGitFetcher::new();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let mut lock = lock_with(&[("foo/bar", "v1", OLD)]);
        let ctx = OperationContext::new();
        ctx.cancel();
        let err = update_lock_file(&mut resolver, &ctx, &mut lock, false).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_workflow_files_rewritten() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".github/workflows");
        write_file(&dir, "a.md", &format!("---\nsteps:\n  - uses: foo/bar@{OLD} # v1\n---\n# A\n"));
        write_file(&dir, "b.md", "---\nsteps:\n  - uses: other/x@v1\n---\n");
        let changes = vec![ActionChange {
            repo: "foo/bar".to_string(),
            from_version: "v1".to_string(),
            to_version: "v1.1".to_string(),
            old_sha: OLD.to_string(),
            new_sha: SHA_1.to_string(),
        }];

        let rewritten = update_workflow_files(&dir, &changes).unwrap();
        assert_eq!(rewritten, vec![dir.join("a.md")]);
        let content = std::fs::read_to_string(dir.join("a.md")).unwrap();
        assert!(content.contains(&format!("foo/bar@{SHA_1} # v1.1")));
        assert!(update_workflow_files(&temp.path().join("missing"), &changes).unwrap().is_empty());
    }
}
