//! Operation-scoped context for cross-module state management.
//!
//! Provides a context object that flows through a single CLI operation
//! (resolve, validate, update), carrying the cancellation signal and
//! warning de-duplication without global state.
//!
//! # Example
//!
//! ```rust,no_run
//! use awf_cli::core::OperationContext;
//! use std::path::Path;
//!
//! let ctx = OperationContext::new();
//!
//! // First warning for a file
//! assert!(ctx.should_warn_file(Path::new("shared/tools.md")));
//!
//! // Subsequent warnings deduplicated
//! assert!(!ctx.should_warn_file(Path::new("shared/tools.md")));
//!
//! // Cancellation is observed at the next checkpoint
//! ctx.cancel();
//! assert!(ctx.checkpoint().is_err());
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::AwfError;

/// Context for a single CLI operation.
///
/// Checks against [`OperationContext::checkpoint`] happen before each queue
/// dequeue and before each blocking I/O call. Once cancelled, every later
/// checkpoint fails with [`AwfError::Cancelled`].
#[derive(Debug, Default)]
pub struct OperationContext {
    /// Cancellation signal shared with the Ctrl-C handler.
    cancel: CancellationToken,

    /// Files that have already emitted warnings during this operation.
    warned_files: Mutex<HashSet<String>>,
}

impl OperationContext {
    /// Create a new operation context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that cancels this operation when triggered.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the operation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`AwfError::Cancelled`] if cancellation has been requested.
    pub fn checkpoint(&self) -> Result<(), AwfError> {
        if self.cancel.is_cancelled() {
            Err(AwfError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Check if we should warn about a file and mark it as warned.
    ///
    /// Returns `true` the first time a path is seen in this operation.
    pub fn should_warn_file(&self, path: &Path) -> bool {
        let key = path.to_string_lossy().to_string();
        match self.warned_files.lock() {
            Ok(mut warned) => warned.insert(key),
            // A poisoned lock only loses de-duplication; keep warning
            Err(_) => true,
        }
    }
}
