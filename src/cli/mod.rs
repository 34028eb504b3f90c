//! Command-line interface for AWF.
//!
//! # Commands
//!
//! - `resolve` - Resolve a workflow's imports and print the merged result
//! - `validate` (alias `check`) - Parse, schema-check and resolve workflows
//! - `fix` - Apply codemods that migrate deprecated frontmatter
//! - `update` - Move pinned actions to their newest compatible release
//! - `add` - Copy a workflow from another repository
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - Debug logging or errors only
//! - `--config <path>` - Configuration file, overriding `AWF_CONFIG` and the
//!   project's `.github/aw/config.toml`
//! - `--project <dir>` - Project root, instead of the nearest ancestor
//!   containing `.git` or `.github`
//!
//! # Examples
//!
//! ```bash
//! # Check every workflow in .github/workflows
//! awf check
//!
//! # Preview and then apply migrations
//! awf fix
//! awf fix --write
//!
//! # Update pinned actions, allowing new majors
//! awf update --major
//! ```

mod add;
mod common;
mod fix;
mod resolve;
mod update;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::OperationContext;

pub use common::CommandContext;

/// Agentic workflow toolkit.
#[derive(Parser, Debug)]
#[command(
    name = "awf",
    about = "Agentic workflow toolkit - resolve imports, migrate frontmatter and pin actions",
    version,
    long_about = "AWF works on agentic workflow markdown files: it resolves and merges their \
                  frontmatter imports, validates them against the workflow schema, migrates \
                  deprecated fields and keeps pinned GitHub Actions up to date."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file to use instead of the project configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root directory
    #[arg(long, global = true)]
    project: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a workflow's imports and print the merged result as JSON
    Resolve(resolve::ResolveCommand),

    /// Validate workflows: frontmatter syntax, schema and imports
    #[command(alias = "check")]
    Validate(validate::ValidateCommand),

    /// Migrate deprecated frontmatter with codemods
    Fix(fix::FixCommand),

    /// Update pinned GitHub Actions and the actions lock file
    Update(update::UpdateCommand),

    /// Add a workflow from a remote repository
    Add(add::AddCommand),
}

impl Cli {
    /// Log filter selected by `--verbose` / `--quiet`, if any.
    ///
    /// `None` leaves the choice to `RUST_LOG`.
    pub fn log_filter(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }

    /// Run the selected command.
    ///
    /// # Errors
    ///
    /// Any failure of the command, including [`crate::core::AwfError::Cancelled`]
    /// when `ctx` is cancelled.
    pub async fn execute(self, ctx: &OperationContext) -> Result<()> {
        let context = CommandContext::load(self.project.as_deref(), self.config.as_deref())?;
        tracing::debug!("Project root: {}", context.project_root.display());

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&context, ctx).await,
            Commands::Validate(cmd) => cmd.execute(&context, ctx).await,
            Commands::Fix(cmd) => cmd.execute(&context),
            Commands::Update(cmd) => cmd.execute(&context, ctx).await,
            Commands::Add(cmd) => cmd.execute(&context, ctx).await,
        }
    }
}
