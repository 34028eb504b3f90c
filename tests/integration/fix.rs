use predicates::prelude::*;

use crate::common::TestProject;

const LEGACY: &str = "---\non: push\ntimeout_minutes: 10\ntools:\n  bash:\n  serena:\n    mode: local  # old\n---\n# Body\n\ntools:\n  bash:\n";

#[test]
fn test_dry_run_leaves_files_alone() {
    let project = TestProject::new();
    project.workflow("w.md", LEGACY);

    project
        .awf(&["fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would fix .github/workflows/w.md"))
        .stdout(predicate::str::contains("bash-anonymous-to-true"))
        .stdout(predicate::str::contains("re-run with --write"));
    assert_eq!(project.read(".github/workflows/w.md"), LEGACY);
}

#[test]
fn test_write_applies_codemods_once() {
    let project = TestProject::new();
    project.workflow("w.md", LEGACY);

    project.awf(&["fix", "--write"]).assert().success().stdout(predicate::str::contains("Fixed"));
    let fixed = project.read(".github/workflows/w.md");
    assert_eq!(
        fixed,
        "---\non: push\ntimeout-minutes: 10\ntools:\n  bash: true\n  serena:\n    mode: docker  # old\n---\n# Body\n\ntools:\n  bash:\n"
    );

    project
        .awf(&["fix", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workflows need fixing"));
    assert_eq!(project.read(".github/workflows/w.md"), fixed);
}

#[test]
fn test_since_limits_codemods() {
    let project = TestProject::new();
    project.workflow("w.md", LEGACY);

    project
        .awf(&["fix", "--since", "v0.5.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("serena-local-to-docker"))
        .stdout(predicate::str::contains("timeout-minutes-migration").not());

    project
        .awf(&["fix", "--since", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version 'soon'"));
}

#[test]
fn test_list_codemods() {
    let project = TestProject::new();
    let assert = project.awf(&["fix", "--list"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for id in [
        "timeout-minutes-migration",
        "command-to-slash-command",
        "bash-anonymous-to-true",
        "expires-integer-to-string",
        "serena-local-to-docker",
        "network-firewall-removal",
    ] {
        assert!(stdout.contains(id), "missing {id} in {stdout}");
    }
}
