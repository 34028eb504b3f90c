//! AWF - agentic workflow toolkit
//!
//! Agentic workflows are markdown files whose YAML frontmatter configures an
//! AI-agent driven GitHub Actions job. Frontmatter can import fragments from
//! other files, locally or from other repositories, and those fragments can
//! import further ones. This crate resolves that import graph into a single
//! merged configuration and maintains workflows over time.
//!
//! # Architecture Overview
//!
//! A workflow enters [`markdown::FrontmatterParser`]; its `imports` field
//! seeds the breadth-first traversal in [`resolver::ImportResolver`]. Each
//! import is materialized by the path resolver (local file or cached remote
//! fetch), harvested by the field extractor and folded into an
//! [`resolver::ImportsResult`]. The import graph is then topologically
//! ordered, and a cycle anywhere aborts the resolve.
//!
//! Independent of resolution:
//! - [`schema::SchemaValidator`] checks frontmatter against the embedded
//!   JSON schema and suggests fixes for typos and misplaced keys
//! - [`codemods::CodemodEngine`] migrates deprecated frontmatter while
//!   keeping comments and the markdown body intact
//! - [`actions::ActionVersionResolver`] keeps pinned GitHub Actions and the
//!   actions lock file on their newest compatible release
//!
//! # Core Modules
//!
//! ## Documents and Resolution
//! - [`markdown`] - Workflow documents, frontmatter parsing, sections
//! - [`resolver`] - Import specs, path resolution, extraction, merge, graph
//! - [`schema`] - JSON schema validation with suggestions
//!
//! ## Maintenance
//! - [`codemods`] - Versioned frontmatter migrations
//! - [`version`] - Precision-aware action versions
//! - [`lockfile`] - The actions lock file
//! - [`actions`] - Action release lookup and workflow rewriting
//!
//! ## Remote Access
//! - [`github`] - GitHub API through the host `gh` CLI
//! - [`git`] - `git ls-remote` tag listing
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Project configuration (`.github/aw/config.toml`)
//! - [`core`] - Error taxonomy and operation context
//! - [`utils`] - File, path and subprocess helpers
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Print the merged imports of a workflow
//! awf resolve triage
//!
//! # Validate every workflow
//! awf check
//!
//! # Apply codemods
//! awf fix --write
//!
//! # Update pinned actions
//! awf update
//!
//! # Add a workflow from another repository
//! awf add octo/flows/workflows/triage.md@v1
//! ```

// Documents and resolution
pub mod markdown;
pub mod resolver;
pub mod schema;

// Maintenance
pub mod actions;
pub mod codemods;
pub mod lockfile;
pub mod version;

// Remote access
pub mod git;
pub mod github;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
