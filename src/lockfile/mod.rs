//! The actions lock file: pinned action versions and their commit digests.
//!
//! # Format
//!
//! ```json
//! {
//!   "entries": {
//!     "actions/checkout@v5": {
//!       "repo": "actions/checkout",
//!       "version": "v5",
//!       "sha": "08c6903cd8c0fde910a37f88322edcfb5dd907a8"
//!     }
//!   }
//! }
//! ```
//!
//! Entries are keyed by `"<repo>@<version>"` and the key always agrees with
//! the entry's own `repo` and `version`. Keys are written in lexicographic
//! order, pretty-printed with two-space indentation and a trailing newline,
//! so regenerating an unchanged lock file produces identical bytes.

mod io;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::AwfError;

/// One pinned action version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLockEntry {
    /// Action repository (`actions/checkout`, `github/codeql-action/init`)
    pub repo: String,
    /// Version tag as written in workflows (`v5`, `v5.0.1`)
    pub version: String,
    /// 40-character commit digest the tag resolved to
    pub sha: String,
}

impl ActionLockEntry {
    /// Create an entry.
    pub fn new(
        repo: impl Into<String>,
        version: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            version: version.into(),
            sha: sha.into(),
        }
    }

    /// Lock file key for this entry.
    pub fn key(&self) -> String {
        ActionLockFile::key(&self.repo, &self.version)
    }
}

/// Registry of pinned actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLockFile {
    /// Entries keyed by `"<repo>@<version>"`
    #[serde(default)]
    pub entries: BTreeMap<String, ActionLockEntry>,
}

impl ActionLockFile {
    /// Create an empty lock file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `repo` at `version`.
    pub fn key(repo: &str, version: &str) -> String {
        format!("{repo}@{version}")
    }

    /// Look up the entry for `repo` at `version`.
    pub fn get(&self, repo: &str, version: &str) -> Option<&ActionLockEntry> {
        self.entries.get(&Self::key(repo, version))
    }

    /// Insert or replace an entry under its derived key.
    pub fn insert(&mut self, entry: ActionLockEntry) -> Option<ActionLockEntry> {
        self.entries.insert(entry.key(), entry)
    }

    /// Remove the entry for `repo` at `version`.
    pub fn remove(&mut self, repo: &str, version: &str) -> Option<ActionLockEntry> {
        self.entries.remove(&Self::key(repo, version))
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionLockEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lock file has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every key agrees with its entry.
    ///
    /// # Errors
    ///
    /// [`AwfError::Config`] naming the first inconsistent key.
    pub fn validate(&self) -> Result<(), AwfError> {
        for (key, entry) in &self.entries {
            if *key != entry.key() {
                return Err(AwfError::Config {
                    message: format!(
                        "actions lock entry '{key}' describes {}@{}; keys must be '<repo>@<version>'",
                        entry.repo, entry.version
                    ),
                });
            }
        }
        Ok(())
    }

    /// Serialize in the canonical on-disk form.
    ///
    /// # Errors
    ///
    /// [`AwfError::Config`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, AwfError> {
        let mut text = serde_json::to_string_pretty(self).map_err(|e| AwfError::Config {
            message: format!("Failed to serialize actions lock: {e}"),
        })?;
        text.push('\n');
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA_A: &str = "08c6903cd8c0fde910a37f88322edcfb5dd907a8";
    const SHA_B: &str = "b4ffde65f46336ab88eb53be808477a3936bae11";

    #[test]
    fn test_canonical_serialization() {
        let mut lock = ActionLockFile::new();
        lock.insert(ActionLockEntry::new("actions/setup-node", "v4", SHA_B));
        lock.insert(ActionLockEntry::new("actions/checkout", "v5", SHA_A));

        let text = lock.to_json_string().unwrap();
        let expected = format!(
            "{{\n  \"entries\": {{\n    \"actions/checkout@v5\": {{\n      \"repo\": \"actions/checkout\",\n      \"version\": \"v5\",\n      \"sha\": \"{SHA_A}\"\n    }},\n    \"actions/setup-node@v4\": {{\n      \"repo\": \"actions/setup-node\",\n      \"version\": \"v4\",\n      \"sha\": \"{SHA_B}\"\n    }}\n  }}\n}}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_lookup_and_replace() {
        let mut lock = ActionLockFile::new();
        assert!(lock.is_empty());
        lock.insert(ActionLockEntry::new("foo/bar", "v5.0.0", "old"));
        let previous = lock.insert(ActionLockEntry::new("foo/bar", "v5.0.0", SHA_A));
        assert_eq!(previous.unwrap().sha, "old");
        assert_eq!(lock.get("foo/bar", "v5.0.0").unwrap().sha, SHA_A);
        assert_eq!(lock.len(), 1);
        assert!(lock.remove("foo/bar", "v5.0.0").is_some());
        assert!(lock.get("foo/bar", "v5.0.0").is_none());
    }

    #[test]
    fn test_validate_rejects_mismatched_keys() {
        let mut lock = ActionLockFile::new();
        lock.entries.insert("foo/bar@v1".into(), ActionLockEntry::new("foo/bar", "v2", SHA_A));
        assert!(matches!(lock.validate(), Err(AwfError::Config { .. })));
    }
}
