//! Lifecycle of a single action update.

use std::fmt;

/// Where an in-flight action update stands.
///
/// ```text
/// Idle -> Querying -> Resolved -> Applied
///             |          ^    \-> Skipped
///             v          |
///        FallingBack ----+
///             |
///             v
///           Failed   (also reachable from Querying)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// Nothing has happened yet
    Idle,
    /// Release listing through the API is in progress
    Querying,
    /// A release was chosen and its digest is known
    Resolved,
    /// The API could not authenticate; listing tags with git instead
    FallingBack,
    /// No usable release could be found
    Failed,
    /// The lock entry was replaced with a newer digest
    Applied,
    /// The lock entry already has the resolved digest
    Skipped,
}

impl UpdateState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: Self) -> bool {
        use UpdateState::*;
        matches!(
            (self, next),
            (Idle, Querying)
                | (Querying, Resolved)
                | (Querying, FallingBack)
                | (Querying, Failed)
                | (FallingBack, Resolved)
                | (FallingBack, Failed)
                | (Resolved, Failed)
                | (Resolved, Applied)
                | (Resolved, Skipped)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Applied | Self::Skipped)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Querying => "querying",
            Self::Resolved => "resolved",
            Self::FallingBack => "falling back",
            Self::Failed => "failed",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Records the states one action update passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTracker {
    subject: String,
    history: Vec<UpdateState>,
}

impl UpdateTracker {
    /// Start tracking the update of `subject` (`repo@version`) in [`UpdateState::Idle`].
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            history: vec![UpdateState::Idle],
        }
    }

    /// Current state.
    pub fn state(&self) -> UpdateState {
        self.history.last().copied().unwrap_or(UpdateState::Idle)
    }

    /// Every state visited so far, oldest first.
    pub fn history(&self) -> &[UpdateState] {
        &self.history
    }

    /// Move to `next`.
    ///
    /// Illegal transitions are ignored and logged.
    pub fn advance(&mut self, next: UpdateState) -> bool {
        let current = self.state();
        if !current.can_advance_to(next) {
            tracing::warn!("Ignoring update transition {current} -> {next} for {}", self.subject);
            return false;
        }
        tracing::trace!("{}: {current} -> {next}", self.subject);
        self.history.push(next);
        true
    }
}
