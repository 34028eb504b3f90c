//! `uses:` line rewriting for workflow frontmatter.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::codemods::lines::FrontmatterLines;

use super::is_commit_sha;
use super::updater::ActionChange;

/// `uses: owner/repo[/path]@ref  # comment`, optionally as a list item or quoted.
static USES_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<lead>\s*(?:-\s+)?uses:\s*)(?P<open>["']?)(?P<repo>[A-Za-z0-9_.-]+/[A-Za-z0-9_./-]+)@(?P<reference>[A-Za-z0-9_./-]+)(?P<close>["']?)(?:\s*#\s*(?P<comment>.*?))?\s*$"#,
    )
    .ok()
});

/// An action reference found on a `uses:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesReference {
    /// Action repository, including any sub-path
    pub repo: String,
    /// Tag, branch or commit digest after `@`
    pub reference: String,
    /// Trailing comment text without `#`
    pub comment: Option<String>,
}

/// Parse a `uses:` line; `None` for any other line.
pub fn parse_uses_line(line: &str) -> Option<UsesReference> {
    let caps = USES_LINE.as_ref()?.captures(line)?;
    Some(UsesReference {
        repo: caps["repo"].to_string(),
        reference: caps["reference"].to_string(),
        comment: caps.name("comment").map(|m| m.as_str().to_string()),
    })
}

/// Apply `changes` to the `uses:` lines of a workflow's frontmatter.
///
/// A line pinned to a commit digest keeps its digest pinning: the digest is
/// replaced and the comment becomes the new version tag. A line pinned to a
/// tag gets the new tag and keeps its comment. The markdown body is never
/// touched.
///
/// Returns `None` when nothing changed.
pub fn rewrite_uses(content: &str, changes: &[ActionChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    let mut lines = FrontmatterLines::split(content)?;
    let mut changed = false;
    for line in lines.lines.iter_mut() {
        if let Some(updated) = rewrite_line(line, changes) {
            *line = updated;
            changed = true;
        }
    }
    changed.then(|| lines.render())
}

fn rewrite_line(line: &str, changes: &[ActionChange]) -> Option<String> {
    let caps = USES_LINE.as_ref()?.captures(line)?;
    let repo = &caps["repo"];
    let reference = caps.name("reference")?;
    let comment = caps.name("comment");

    if is_commit_sha(reference.as_str()) {
        let pinned = reference.as_str();
        let tag = comment.map(|m| m.as_str().trim());
        let change = changes.iter().find(|c| {
            c.repo == repo
                && (c.old_sha.eq_ignore_ascii_case(pinned) || tag == Some(c.from_version.as_str()))
        })?;
        if change.new_sha == pinned && tag == Some(change.to_version.as_str()) {
            return None;
        }
        return Some(pin_digest(line, &caps, change));
    }

    let change = changes
        .iter()
        .find(|c| c.repo == repo && c.from_version == reference.as_str())?;
    if change.to_version == reference.as_str() {
        return None;
    }
    Some(format!(
        "{}{}{}",
        &line[..reference.start()],
        change.to_version,
        &line[reference.end()..]
    ))
}

fn pin_digest(line: &str, caps: &Captures<'_>, change: &ActionChange) -> String {
    let Some(reference) = caps.name("reference") else {
        return line.to_string();
    };
    let head = &line[..reference.start()];
    match caps.name("comment") {
        Some(comment) => format!(
            "{head}{}{}{}{}",
            change.new_sha,
            &line[reference.end()..comment.start()],
            change.to_version,
            &line[comment.end()..]
        ),
        None => {
            let close = caps.name("close").map_or("", |m| m.as_str());
            format!("{head}{}{close} # {}", change.new_sha, change.to_version)
        }
    }
}
