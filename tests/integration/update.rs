use awf_cli::actions::{ActionVersionResolver, update_lock_file, update_workflow_files};
use awf_cli::core::{AwfError, OperationContext};
use awf_cli::lockfile::{ActionLockEntry, ActionLockFile};
use awf_cli::test_utils::{MockGitFetcher, MockRemoteFetcher, init_test_logging, workflow_using};
use predicates::prelude::*;

use crate::common::TestProject;

const LOCK: &str = ".github/aw/actions-lock.json";
const OLD: &str = "0000000000000000000000000000000000000000";
const NEW: &str = "5555555555555555555555555555555555555555";

#[test]
fn test_update_without_lock_file() {
    let project = TestProject::new();
    project
        .awf(&["update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No actions pinned in .github/aw/actions-lock.json"));
}

#[test]
fn test_update_failures_do_not_fail_the_command() {
    let project = TestProject::new();
    let mut lock = ActionLockFile::new();
    lock.insert(ActionLockEntry::new("foo/bar", "v1", OLD));
    let original = lock.to_json_string().unwrap();
    project.write(LOCK, &original);

    project
        .awf(&["update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to check:"))
        .stdout(predicate::str::contains("foo/bar@v1"));
    assert_eq!(project.read(LOCK), original);
}

#[tokio::test]
async fn test_update_pipeline_rewrites_lock_and_workflows() {
    init_test_logging(None);
    let project = TestProject::new();
    let workflow = workflow_using("foo/bar", OLD, "v5.0.0");
    project.workflow("w.md", &workflow);
    let lock_path = project.root().join(LOCK);
    let mut lock = ActionLockFile::new();
    lock.insert(ActionLockEntry::new("foo/bar", "v5.0.0", OLD));
    lock.save(&lock_path).unwrap();

    let remote = MockRemoteFetcher::new()
        .with_releases("foo/bar", &["v4", "v5", "v5.0.0", "v5.0.1", "v6"])
        .with_tag_sha("foo/bar", "v5.0.1", NEW);
    let git = MockGitFetcher::new();
    let ctx = OperationContext::new();

    let mut lock = ActionLockFile::load(&lock_path).unwrap();
    let mut resolver = ActionVersionResolver::new(&remote, &git);
    let report = update_lock_file(&mut resolver, &ctx, &mut lock, false).await.unwrap();
    assert_eq!(report.updated.len(), 1);
    lock.save(&lock_path).unwrap();
    let rewritten =
        update_workflow_files(&project.root().join(".github/workflows"), &report.updated).unwrap();
    assert_eq!(rewritten.len(), 1);

    let saved = project.read(LOCK);
    assert!(saved.contains("\"foo/bar@v5.0.1\""));
    assert!(!saved.contains("v5.0.0"));
    assert!(saved.ends_with("}\n"));

    let updated = project.read(".github/workflows/w.md");
    assert_eq!(updated, workflow_using("foo/bar", NEW, "v5.0.1"));

    // A second run finds nothing to do
    let mut lock = ActionLockFile::load(&lock_path).unwrap();
    let mut resolver = ActionVersionResolver::new(&remote, &git);
    let report = update_lock_file(&mut resolver, &ctx, &mut lock, false).await.unwrap();
    assert!(!report.has_changes());
    assert_eq!(report.up_to_date, vec!["foo/bar@v5.0.1".to_string()]);
}

#[tokio::test]
async fn test_core_actions_fall_back_to_git_and_cross_majors() {
    init_test_logging(None);
    let remote = MockRemoteFetcher::new().with_release_error(
        "actions/cache",
        AwfError::Auth {
            subsystem: "github api".to_string(),
        },
    );
    let git = MockGitFetcher::new().with_tags("actions/cache", &[("v3", OLD), ("v4", NEW)]);
    let mut lock = ActionLockFile::new();
    lock.insert(ActionLockEntry::new("actions/cache/restore", "v3", OLD));

    let mut resolver = ActionVersionResolver::new(&remote, &git);
    let report =
        update_lock_file(&mut resolver, &OperationContext::new(), &mut lock, false).await.unwrap();

    assert_eq!(report.updated[0].to_version, "v4");
    assert_eq!(lock.get("actions/cache/restore", "v4").unwrap().sha, NEW);
    assert_eq!(git.calls(), 1);
}
