use predicates::prelude::*;
use serde_json::{Value, json};

use crate::common::TestProject;

fn diamond(project: &TestProject) {
    project.workflow("A.md", "---\non: push\nimports: [B.md, C.md]\n---\n# A\n");
    project.workflow("B.md", "---\nimports: [D.md]\ntools:\n  bash: true\n---\n# B\n");
    project.workflow("C.md", "---\nimports: [D.md]\nlabels: [c]\n---\n# C\n");
    project.workflow("D.md", "---\nlabels: [shared]\n---\n# D\n");
}

#[test]
fn test_resolve_prints_topological_order() {
    let project = TestProject::new();
    diamond(&project);

    let output = project.awf(&["resolve", "A"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["imported-files"], json!(["D.md", "B.md", "C.md", "A.md"]));
    assert_eq!(result["merged-tools"], json!([{"bash": true}]));
    assert_eq!(result["merged-labels"], json!(["c", "shared"]));
}

#[test]
fn test_resolve_is_deterministic() {
    let project = TestProject::new();
    diamond(&project);

    let first = project.awf(&["resolve", "A.md", "--compact"]).output().unwrap();
    let second = project.awf(&["resolve", "A.md", "--compact"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_resolve_reports_cycles() {
    let project = TestProject::new();
    project.workflow("A.md", "---\non: push\nimports: [B.md]\n---\n");
    project.workflow("B.md", "---\nimports: [A.md]\n---\n");

    project
        .awf(&["resolve", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular import"))
        .stderr(predicate::str::contains("A.md -> B.md -> A.md"));
}

#[test]
fn test_resolve_missing_workflow() {
    let project = TestProject::new();
    project
        .awf(&["resolve", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found: nope"));
}
