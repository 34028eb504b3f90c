//! Test utilities for AWF
//!
//! In-memory stand-ins for the remote collaborators plus small fixture and
//! logging helpers. Available to unit tests and, through the `test-utils`
//! feature, to the integration suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use awf_cli::test_utils::{MockRemoteFetcher, write_file};
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! write_file(temp.path(), "A.md", "---\nimports: [owner/repo/dir/F.md@v1]\n---\n");
//!
//! let fetcher = MockRemoteFetcher::new()
//!     .with_file("owner", "repo", "v1", "dir/F.md", "# F\n");
//! ```

mod mocks;

pub use mocks::{MockGitFetcher, MockRemoteFetcher};

use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. With `level` unset, `RUST_LOG` decides
/// and nothing is logged when it is absent.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Write `content` to `dir/rel`, creating parent directories.
///
/// # Panics
///
/// Panics when the file cannot be written.
pub fn write_file(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
    }
    std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// A workflow using one action, pinned by digest with a version comment.
pub fn workflow_using(repo: &str, sha: &str, version: &str) -> String {
    format!(
        "---\non: push\nsteps:\n  - uses: {repo}@{sha} # {version}\n---\n# Workflow\n\nDo the work.\n"
    )
}
