use predicates::prelude::*;

use crate::common::TestProject;

const VALID: &str = "---\non: push\nengine: copilot\ntimeout-minutes: 20\n---\n# Task\n";

#[test]
fn test_valid_workflows_pass() {
    let project = TestProject::new();
    project.workflow("good.md", VALID);

    project
        .awf(&["validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ .github/workflows/good.md"))
        .stdout(predicate::str::contains("All 1 workflow(s) are valid"));
}

#[test]
fn test_typos_get_suggestions() {
    let project = TestProject::new();
    project.workflow("typo.md", "---\non: push\ntimeout-minute: 10\n---\n# Task\n");

    project
        .awf(&["check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ .github/workflows/typo.md"))
        .stderr(predicate::str::contains("typo.md:3:1"))
        .stderr(predicate::str::contains("Did you mean 'timeout-minutes'?"))
        .stderr(predicate::str::contains("1 of 1 workflow(s) failed validation"));
}

#[test]
fn test_only_named_workflows_are_checked() {
    let project = TestProject::new();
    project.workflow("good.md", VALID);
    project.workflow("broken.md", "---\non: [\n---\n");

    project.awf(&["check", "good"]).assert().success();
    project
        .awf(&["check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 workflow(s) failed validation"));
}

#[test]
fn test_unresolvable_imports_are_reported() {
    let project = TestProject::new();
    project.workflow("w.md", "---\non: push\nimports:\n  - shared/missing.md\n---\n");

    project
        .awf(&["validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to resolve import 'shared/missing.md'"));

    project.awf(&["validate", "--no-imports"]).assert().success();
}
