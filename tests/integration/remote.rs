use awf_cli::core::OperationContext;
use awf_cli::resolver::ImportResolver;
use awf_cli::test_utils::{MockRemoteFetcher, init_test_logging};
use predicates::prelude::*;
use serde_json::json;
use std::sync::Arc;

use crate::common::TestProject;

#[tokio::test]
async fn test_remote_imports_with_inputs() {
    init_test_logging(None);
    let project = TestProject::new();
    let root = project.workflow(
        "review.md",
        "---\non: pull_request\nimports:\n  - path: octo/lib/shared/review.md@v2\n    inputs:\n      language: rust\n---\n# Review\n",
    );
    let fetcher = MockRemoteFetcher::new()
        .with_file(
            "octo",
            "lib",
            "v2",
            "shared/review.md",
            "---\ninputs:\n  language:\n    required: true\nimports: [tools.md]\n---\nReview ${{ github.aw.inputs.language }} code.\n",
        )
        .with_file("octo", "lib", "v2", "shared/tools.md", "---\ntools:\n  github: {}\n---\n# Tools\n");

    let mut resolver = ImportResolver::new(Arc::new(fetcher));
    let result = resolver.resolve_file(&root, &OperationContext::new()).await.unwrap();

    assert_eq!(
        result.imported_files,
        vec!["octo/lib/shared/tools.md@v2", "octo/lib/shared/review.md@v2", "review.md"]
    );
    assert!(result.merged_markdown.contains("Review rust code."));
    assert_eq!(result.merged_tools, vec![json!({"github": {}})]);
    assert_eq!(result.import_inputs.get("language"), Some(&json!("rust")));
    assert_eq!(resolver.fetch_count(), 2);
}

#[test]
fn test_add_rejects_non_workflowspecs() {
    let project = TestProject::new();
    project
        .awf(&["add", "triage.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a workflowspec"));
}

#[test]
fn test_add_refuses_to_overwrite() {
    let project = TestProject::new();
    project.workflow("triage.md", "---\non: push\n---\n");
    project
        .awf(&["add", "octo/flows/workflows/triage.md@v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_add_without_gh_reports_auth() {
    let project = TestProject::new();
    project
        .awf(&["add", "octo/flows/workflows/triage.md@v1", "--name", "copy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("authentication failed"));
    assert!(!project.root().join(".github/workflows/copy.md").exists());
}
