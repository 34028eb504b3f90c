//! Loading and saving the actions lock file.

use anyhow::{Context, Result};
use std::path::Path;

use crate::utils::fs::safe_write;

use super::ActionLockFile;

impl ActionLockFile {
    /// Load the lock file at `path`.
    ///
    /// A missing or empty file yields an empty lock file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not valid JSON, or has keys that
    /// disagree with their entries.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read actions lock: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let lock: Self = serde_json::from_str(&content).with_context(|| {
            format!(
                "Invalid actions lock: {}\n\n\
                 The file must be JSON of the form {{\"entries\": {{\"<repo>@<version>\": {{...}}}}}}",
                path.display()
            )
        })?;
        lock.validate()?;
        Ok(lock)
    }

    /// Write the lock file in canonical form in a single atomic write.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json_string()?;
        safe_write(path, &text)
            .with_context(|| format!("Failed to write actions lock: {}", path.display()))?;
        tracing::debug!("Wrote {} action pins to {}", self.len(), path.display());
        Ok(())
    }
}
