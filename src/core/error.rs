//! Error handling for AWF
//!
//! This module provides the error taxonomy surfaced to callers and the
//! user-friendly rendering used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so callers can match on the failure kind
//! 2. **User-friendly messages** with a suggestion block where a heuristic applies
//!
//! # Architecture
//!
//! - [`AwfError`] - Enumerated error kinds for every failure the resolver,
//!   validator, codemod engine and action updater can report
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Every variant carries a file path or reference so the caller can point the
//! user at the originating source token.
//!
//! # Examples
//!
//! ```rust,no_run
//! use awf_cli::core::{AwfError, ErrorContext};
//!
//! let context = ErrorContext::new(AwfError::NotFound {
//!     reference: "shared/tools.md".to_string(),
//! })
//! .with_suggestion("Check that the imported file exists relative to the workflow");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Classification of a schema validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// A property that the schema does not allow at this location.
    UnknownProperty {
        /// The offending property name
        property: String,
    },
    /// A value whose JSON type does not match the schema.
    WrongType {
        /// Expected type(s) as rendered by the schema
        expected: String,
    },
    /// A property the schema requires but the document omits.
    MissingRequired {
        /// The missing property name
        property: String,
    },
    /// A value outside the schema's enumeration.
    EnumViolation {
        /// The offending value rendered as JSON
        value: String,
        /// The allowed literals
        allowed: Vec<String>,
    },
    /// Any other constraint violation.
    Other,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty {
                ..
            } => write!(f, "unknown property"),
            Self::WrongType {
                ..
            } => write!(f, "wrong type"),
            Self::MissingRequired {
                ..
            } => write!(f, "missing required"),
            Self::EnumViolation {
                ..
            } => write!(f, "enum violation"),
            Self::Other => write!(f, "constraint violation"),
        }
    }
}

/// The main error type for AWF operations
///
/// Each variant represents one failure mode of the import resolver, schema
/// validator, codemod engine, or action-version updater. Variants carry the
/// structured context (file, line, column, reference) needed to render a
/// source-pointed message.
///
/// # Error Categories
///
/// ## Parsing and Validation
/// - [`Syntax`] - YAML frontmatter failed to parse
/// - [`Schema`] - Frontmatter violates the JSON schema
///
/// ## Import Resolution
/// - [`Import`] - An import could not be resolved from its parent document
/// - [`InvalidImport`] - An `imports` entry has an unsupported shape
/// - [`CircularImport`] - The import graph contains a cycle
/// - [`ConflictingAgent`] - More than one custom agent was imported
/// - [`LockFileImport`] - A compiled `.lock.yml` was referenced as an import
/// - [`PathEscape`] - A remote import escapes its repository or base path
/// - [`MissingImportInput`] - A required import input was not supplied
///
/// ## Remote Access
/// - [`NotFound`] - Local or remote file does not exist
/// - [`Forbidden`] - Remote access was denied
/// - [`Auth`] - A subsystem could not authenticate
/// - [`Fetch`] - Any other remote failure
/// - [`ActionResolution`] - No usable release for a pinned action
///
/// ## Runtime
/// - [`Cancelled`] - The operation was cancelled
/// - [`FileSystem`] - Reading or writing a file failed
/// - [`Config`] - Configuration file problems
/// - [`Other`] - Anything without a more specific kind
///
/// [`Syntax`]: AwfError::Syntax
/// [`Schema`]: AwfError::Schema
/// [`Import`]: AwfError::Import
/// [`InvalidImport`]: AwfError::InvalidImport
/// [`CircularImport`]: AwfError::CircularImport
/// [`ConflictingAgent`]: AwfError::ConflictingAgent
/// [`LockFileImport`]: AwfError::LockFileImport
/// [`PathEscape`]: AwfError::PathEscape
/// [`MissingImportInput`]: AwfError::MissingImportInput
/// [`NotFound`]: AwfError::NotFound
/// [`Forbidden`]: AwfError::Forbidden
/// [`Auth`]: AwfError::Auth
/// [`Fetch`]: AwfError::Fetch
/// [`ActionResolution`]: AwfError::ActionResolution
/// [`Cancelled`]: AwfError::Cancelled
/// [`FileSystem`]: AwfError::FileSystem
/// [`Config`]: AwfError::Config
/// [`Other`]: AwfError::Other
#[derive(Error, Debug, Clone)]
pub enum AwfError {
    /// YAML frontmatter could not be parsed.
    ///
    /// `line` and `column` are 1-based and refer to the original document,
    /// not to the frontmatter block. `excerpt` is the rendered source context.
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        /// File containing the frontmatter
        file: String,
        /// 1-based line in the original document
        line: usize,
        /// 1-based column
        column: usize,
        /// Parser message without position prefix
        message: String,
        /// Three lines of source context with a caret
        excerpt: String,
    },

    /// Frontmatter does not conform to the JSON schema.
    #[error("{file}:{line}:{column}: {message}")]
    Schema {
        /// File containing the frontmatter
        file: String,
        /// 1-based line of the offending field
        line: usize,
        /// 1-based column of the offending field
        column: usize,
        /// Classification of the violation
        kind: SchemaErrorKind,
        /// Plain-sentence message
        message: String,
        /// Heuristic suggestions (may be empty)
        suggestions: Vec<String>,
    },

    /// An import listed in a document could not be resolved.
    #[error("{file}:{line}:{column}: failed to resolve import '{import_path}': {cause}")]
    Import {
        /// The import reference as written
        import_path: String,
        /// Document whose `imports` list contains the reference
        file: String,
        /// 1-based line of the reference
        line: usize,
        /// 1-based column of the reference
        column: usize,
        /// Underlying failure rendered as text
        cause: String,
    },

    /// An `imports` entry is neither a string nor a mapping with `path`.
    #[error("invalid import in {file}: {reason}")]
    InvalidImport {
        /// Document containing the entry
        file: String,
        /// What was wrong with the entry
        reason: String,
    },

    /// The import graph contains a cycle.
    ///
    /// `chain` lists the nodes of one representative cycle; its first and
    /// last elements are equal.
    #[error("circular import detected in {workflow_file}: {}", chain.join(" -> "))]
    CircularImport {
        /// Representative cycle, closed on its first element
        chain: Vec<String>,
        /// The workflow whose resolution found the cycle
        workflow_file: String,
    },

    /// File could not be located.
    #[error("file not found: {reference}")]
    NotFound {
        /// Local path or workflowspec that was requested
        reference: String,
    },

    /// Remote access was denied.
    #[error("access denied: {reference}")]
    Forbidden {
        /// Workflowspec or API path that was requested
        reference: String,
    },

    /// A compiled lock file was referenced as an import source.
    #[error(
        "{file}:{line}: cannot import '{reference}': .lock.yml files are compiled outputs, import the .md source instead"
    )]
    LockFileImport {
        /// The import reference as written
        reference: String,
        /// Document containing the reference
        file: String,
        /// 1-based line of the reference
        line: usize,
    },

    /// Two different custom agent files were imported.
    #[error("conflicting agent imports: '{first}' and '{second}' (only one agent file may be imported)")]
    ConflictingAgent {
        /// Agent recorded first
        first: String,
        /// Agent that attempted to replace it
        second: String,
    },

    /// A remote import path climbs out of its repository or base path.
    #[error("import '{path}' escapes the base path '{base_path}'")]
    PathEscape {
        /// Import path as written
        path: String,
        /// Base path of the remote parent, or the repository root
        base_path: String,
    },

    /// A required input of an imported file was not supplied.
    #[error("import '{import_path}' requires input '{input}' but none was provided")]
    MissingImportInput {
        /// The import reference
        import_path: String,
        /// Name of the missing input
        input: String,
    },

    /// A subsystem could not authenticate with the host.
    #[error("authentication failed for {subsystem}")]
    Auth {
        /// Subsystem name (e.g., "github api", "git")
        subsystem: String,
    },

    /// Remote fetch failed for a reason other than not-found/forbidden/auth.
    #[error("failed to fetch {reference}: {reason}")]
    Fetch {
        /// What was being fetched
        reference: String,
        /// Failure description
        reason: String,
    },

    /// No usable release could be determined for an action.
    #[error("could not resolve a release for {repo}@{version}: {reason}")]
    ActionResolution {
        /// Action repository (may include a sub-path)
        repo: String,
        /// Currently pinned version
        version: String,
        /// Why resolution failed
        reason: String,
    },

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// A file system operation failed.
    #[error("failed to {operation} {path}: {reason}")]
    FileSystem {
        /// Operation that failed (e.g., "read", "write")
        operation: String,
        /// Path involved
        path: String,
        /// Underlying error text
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl AwfError {
    /// Build a [`AwfError::FileSystem`] from an I/O error.
    pub fn fs(operation: &str, path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        Self::FileSystem {
            operation: operation.to_string(),
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps an [`AwfError`] and adds optional details and a
/// suggestion. It is the primary way errors are presented to CLI users.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying AWF error
    pub error: AwfError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from an [`AwfError`]
    #[must_use]
    pub const fn new(error: AwfError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with contextual suggestions.
///
/// Known [`AwfError`] values get a tailored suggestion block; I/O errors are
/// mapped onto [`AwfError::FileSystem`]; anything else is rendered verbatim.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Walk the chain so errors wrapped by anyhow context are still recognised
    for cause in error.chain() {
        if let Some(awf_error) = cause.downcast_ref::<AwfError>() {
            return create_error_context(awf_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let ctx = ErrorContext::new(AwfError::FileSystem {
            operation: "access".to_string(),
            path: "unknown".to_string(),
            reason: io_error.to_string(),
        });
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ctx.with_suggestion("Check file ownership and permissions")
            }
            std::io::ErrorKind::NotFound => {
                ctx.with_suggestion("Check that the file or directory exists and the path is correct")
            }
            _ => ctx,
        };
    }

    // Preserve the anyhow context chain as details
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let ctx = ErrorContext::new(AwfError::Other {
        message: error.to_string(),
    });
    if chain.is_empty() {
        ctx
    } else {
        ctx.with_details(chain.join(": "))
    }
}

fn create_error_context(error: AwfError) -> ErrorContext {
    match &error {
        AwfError::Syntax {
            excerpt,
            ..
        } => {
            let excerpt = excerpt.clone();
            ErrorContext::new(error)
                .with_details(excerpt)
                .with_suggestion("Check indentation, quoting and that every mapping key ends with ':'")
        }
        AwfError::Schema {
            suggestions,
            ..
        } => {
            if suggestions.is_empty() {
                ErrorContext::new(error.clone())
            } else {
                let joined = suggestions.join("\n");
                ErrorContext::new(error.clone()).with_suggestion(joined)
            }
        }
        AwfError::CircularImport {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the imports in the chain so the graph becomes acyclic"),
        AwfError::ConflictingAgent {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Import at most one file from .github/agents/ per workflow"),
        AwfError::LockFileImport {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Replace the .lock.yml reference with the .md workflow it was compiled from"),
        AwfError::NotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the path; local imports are resolved relative to the importing file"),
        AwfError::Forbidden {
            ..
        }
        | AwfError::Auth {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'gh auth login' or set GH_TOKEN with access to the repository"),
        AwfError::PathEscape {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remote import paths must stay inside the repository and the importing file's directory"),
        AwfError::MissingImportInput {
            input,
            ..
        } => {
            let suggestion = format!("Add '{input}' under the import's 'inputs:' mapping");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        AwfError::Cancelled => ErrorContext::new(error),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_import_display_joins_chain() {
        let err = AwfError::CircularImport {
            chain: vec!["a.md".to_string(), "b.md".to_string(), "a.md".to_string()],
            workflow_file: "a.md".to_string(),
        };
        assert_eq!(err.to_string(), "circular import detected in a.md: a.md -> b.md -> a.md");
    }

    #[test]
    fn test_user_friendly_error_keeps_schema_suggestions() {
        let err = AwfError::Schema {
            file: "w.md".to_string(),
            line: 3,
            column: 1,
            kind: SchemaErrorKind::UnknownProperty {
                property: "enigne".to_string(),
            },
            message: "Unknown property: enigne".to_string(),
            suggestions: vec!["Did you mean 'engine'?".to_string()],
        };
        let ctx = user_friendly_error(anyhow::Error::from(err));
        assert_eq!(ctx.suggestion.as_deref(), Some("Did you mean 'engine'?"));
        assert!(ctx.to_string().starts_with("w.md:3:1: Unknown property: enigne"));
    }

    #[test]
    fn test_user_friendly_error_maps_io_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let ctx = user_friendly_error(anyhow::Error::from(io));
        assert!(matches!(ctx.error, AwfError::FileSystem { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_syntax_error_details_carry_excerpt() {
        let err = AwfError::Syntax {
            file: "w.md".to_string(),
            line: 2,
            column: 5,
            message: "did not find expected key".to_string(),
            excerpt: "2 | foo: [\n  |     ^".to_string(),
        };
        let ctx = user_friendly_error(anyhow::Error::from(err));
        assert_eq!(ctx.details.as_deref(), Some("2 | foo: [\n  |     ^"));
    }

    #[test]
    fn test_user_friendly_error_generic_fallback() {
        let ctx = user_friendly_error(anyhow::anyhow!("2 of 3 workflow(s) failed validation"));
        assert!(matches!(ctx.error, AwfError::Other { .. }));
        assert_eq!(ctx.to_string(), "2 of 3 workflow(s) failed validation");
    }
}
