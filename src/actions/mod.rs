//! Pinned GitHub Action updates.
//!
//! Workflows reference actions as `uses: owner/repo[/path]@ref`. The actions
//! lock file records the commit digest each pinned version resolves to. This
//! module keeps both current:
//!
//! - [`ActionVersionResolver`] finds the newest compatible release of an
//!   action and the commit it points at, through the GitHub API first and
//!   `git ls-remote` when the API cannot authenticate
//! - [`update_lock_file`] runs the resolver over every lock entry and
//!   reports what moved, what was already current and what failed
//! - [`rewrite_uses`] applies the resulting changes to `uses:` lines of a
//!   workflow's frontmatter
//!
//! # Version selection
//!
//! Releases sharing the pinned major version are candidates unless major
//! upgrades are allowed. Core actions (`actions/*`) always move to the
//! newest major. Among numerically equal tags the less precise one wins, so
//! a workflow pinned to `v8` stays on the floating major tag.

mod resolver;
mod rewrite;
mod state;
mod updater;

use crate::constants::COMMIT_SHA_LEN;

pub use resolver::{ActionVersionResolver, LookupPath, Resolution};
pub use rewrite::{UsesReference, parse_uses_line, rewrite_uses};
pub use state::{UpdateState, UpdateTracker};
pub use updater::{ActionChange, UpdateReport, update_lock_file, update_workflow_files};

/// Organization whose actions always take the newest major release.
pub const CORE_ACTIONS_OWNER: &str = "actions";

/// Repository part of an action reference: its first two path segments.
///
/// `actions/cache/restore` lives in `actions/cache`.
pub fn base_repo(repo: &str) -> &str {
    match repo.match_indices('/').nth(1) {
        Some((index, _)) => &repo[..index],
        None => repo,
    }
}

/// Whether `repo` is maintained under the core actions organization.
pub fn is_core_action(repo: &str) -> bool {
    repo.split('/').next() == Some(CORE_ACTIONS_OWNER) && repo.contains('/')
}

/// Whether `reference` is a full 40-character hexadecimal commit digest.
pub fn is_commit_sha(reference: &str) -> bool {
    reference.len() == COMMIT_SHA_LEN && reference.bytes().all(|b| b.is_ascii_hexdigit())
}
