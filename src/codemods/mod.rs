//! Versioned, idempotent migrations of workflow frontmatter.
//!
//! A [`Codemod`] rewrites one deprecated construct. Every codemod must be:
//!
//! - **idempotent**: applying it to its own output changes nothing and
//!   reports `applied = false`
//! - **local**: only the frontmatter block changes, the body stays
//!   byte-identical
//! - **guarded**: when the deprecated form is absent the input comes back
//!   unchanged without an error
//!
//! The [`CodemodEngine`] runs the registered codemods in a fixed order. A
//! failing codemod is recorded and skipped; the remaining ones still run.
//!
//! # Example
//!
//! ```rust
//! use awf_cli::codemods::CodemodEngine;
//! use std::path::Path;
//!
//! let doc = "---\non: push\ntools:\n  bash:\n---\n# Task\n";
//! let run = CodemodEngine::new().apply(doc, Path::new("w.md")).unwrap();
//!
//! assert_eq!(run.content, "---\non: push\ntools:\n  bash: true\n---\n# Task\n");
//! assert_eq!(run.applied_ids(), vec!["bash-anonymous-to-true"]);
//! ```

pub mod block_scope;
pub mod lines;
mod rules;

use semver::Version;
use std::path::Path;

use crate::core::AwfError;
use crate::markdown::{Frontmatter, FrontmatterParser};

/// Signature of a codemod transform.
pub type CodemodFn = fn(&str, &Frontmatter) -> Result<CodemodOutcome, AwfError>;

/// A registered frontmatter migration.
#[derive(Debug, Clone, Copy)]
pub struct Codemod {
    /// Stable identifier (`expires-integer-to-string`)
    pub id: &'static str,
    /// Short human-readable name
    pub name: &'static str,
    /// What the codemod changes
    pub description: &'static str,
    /// Tool version that introduced the migration
    pub introduced_in: &'static str,
    /// Transform over the full document text and its parsed frontmatter
    pub apply: CodemodFn,
}

impl Codemod {
    /// Parsed `introduced_in`.
    pub fn version(&self) -> Option<Version> {
        Version::parse(self.introduced_in).ok()
    }
}

/// Result of one codemod invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodemodOutcome {
    /// Document text after the transform
    pub content: String,
    /// Whether anything changed
    pub applied: bool,
}

impl CodemodOutcome {
    /// The input returned as-is.
    pub fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            applied: false,
        }
    }

    /// A rewritten document.
    pub fn changed(content: String) -> Self {
        Self {
            content,
            applied: true,
        }
    }
}

/// All built-in codemods in application order.
pub fn registry() -> &'static [Codemod] {
    &rules::REGISTRY
}

/// Per-codemod record of an engine run.
#[derive(Debug, Clone)]
pub struct CodemodResult {
    /// Codemod identifier
    pub id: &'static str,
    /// Whether the codemod changed the document
    pub applied: bool,
    /// Failure that aborted this codemod, if any
    pub error: Option<AwfError>,
}

/// Outcome of running the engine over one document.
#[derive(Debug, Clone)]
pub struct CodemodRun {
    /// Final document text
    pub content: String,
    /// One entry per codemod, in application order
    pub results: Vec<CodemodResult>,
}

impl CodemodRun {
    /// Identifiers of codemods that changed the document.
    pub fn applied_ids(&self) -> Vec<&'static str> {
        self.results.iter().filter(|r| r.applied).map(|r| r.id).collect()
    }

    /// Codemods that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CodemodResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}

/// Applies a selection of codemods in registry order.
#[derive(Debug, Clone)]
pub struct CodemodEngine {
    codemods: Vec<&'static Codemod>,
}

impl Default for CodemodEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CodemodEngine {
    /// Engine running every registered codemod.
    pub fn new() -> Self {
        Self {
            codemods: registry().iter().collect(),
        }
    }

    /// Engine running only codemods introduced after `version`.
    ///
    /// A leading `v` is accepted (`v0.4.0`).
    ///
    /// # Errors
    ///
    /// [`AwfError::Config`] when `version` is not a semantic version.
    pub fn since(version: &str) -> Result<Self, AwfError> {
        let since = Version::parse(version.trim_start_matches('v')).map_err(|e| {
            AwfError::Config {
                message: format!("Invalid version '{version}': {e}"),
            }
        })?;
        let codemods = registry()
            .iter()
            .filter(|c| c.version().is_none_or(|v| v > since))
            .collect();
        Ok(Self {
            codemods,
        })
    }

    /// Codemods this engine will run.
    pub fn codemods(&self) -> &[&'static Codemod] {
        &self.codemods
    }

    /// Run the codemods over `content`.
    ///
    /// # Errors
    ///
    /// [`AwfError::Syntax`] when the input frontmatter cannot be parsed.
    /// Failures of individual codemods are reported in the returned
    /// [`CodemodRun`] instead.
    pub fn apply(&self, content: &str, file: &Path) -> Result<CodemodRun, AwfError> {
        let parsed = FrontmatterParser::parse(content, file)?;
        let Some(mut frontmatter) = parsed.frontmatter else {
            return Ok(CodemodRun {
                content: content.to_string(),
                results: self
                    .codemods
                    .iter()
                    .map(|c| CodemodResult {
                        id: c.id,
                        applied: false,
                        error: None,
                    })
                    .collect(),
            });
        };

        let mut current = content.to_string();
        let mut results = Vec::with_capacity(self.codemods.len());
        for codemod in &self.codemods {
            match self.run_one(codemod, &current, &frontmatter, file) {
                Ok(Some((next, next_frontmatter))) => {
                    tracing::debug!("Applied codemod {} to {}", codemod.id, file.display());
                    current = next;
                    frontmatter = next_frontmatter;
                    results.push(CodemodResult {
                        id: codemod.id,
                        applied: true,
                        error: None,
                    });
                }
                Ok(None) => results.push(CodemodResult {
                    id: codemod.id,
                    applied: false,
                    error: None,
                }),
                Err(error) => {
                    let file = file.display();
                    tracing::warn!("Codemod {} failed on {file}: {error}", codemod.id);
                    results.push(CodemodResult {
                        id: codemod.id,
                        applied: false,
                        error: Some(error),
                    });
                }
            }
        }

        Ok(CodemodRun {
            content: current,
            results,
        })
    }

    /// Apply one codemod and check its output is still a valid document with
    /// the same body.
    fn run_one(
        &self,
        codemod: &Codemod,
        content: &str,
        frontmatter: &Frontmatter,
        file: &Path,
    ) -> Result<Option<(String, Frontmatter)>, AwfError> {
        let outcome = (codemod.apply)(content, frontmatter)?;
        if !outcome.applied || outcome.content == content {
            return Ok(None);
        }
        if FrontmatterParser::split(&outcome.content).1 != FrontmatterParser::split(content).1 {
            return Err(AwfError::Config {
                message: format!("codemod '{}' modified the markdown body", codemod.id),
            });
        }
        let reparsed = FrontmatterParser::parse(&outcome.content, file)?;
        Ok(Some((outcome.content, reparsed.frontmatter.unwrap_or_default())))
    }
}
