//! Apply codemods to workflow files.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;

use crate::codemods::{CodemodEngine, registry};
use crate::core::user_friendly_error;
use crate::utils::fs::{read_text, safe_write};

use super::common::CommandContext;

/// Migrate deprecated frontmatter fields.
///
/// Without `--write` the command only reports which workflows would change.
#[derive(Args, Debug)]
pub struct FixCommand {
    /// Workflows to fix (every workflow when omitted)
    workflows: Vec<String>,

    /// Write the migrated files back to disk
    #[arg(long)]
    write: bool,

    /// Only apply codemods introduced after this version
    #[arg(long, value_name = "VERSION")]
    since: Option<String>,

    /// List the available codemods and exit
    #[arg(long)]
    list: bool,
}

impl FixCommand {
    /// Execute the command.
    pub fn execute(self, context: &CommandContext) -> Result<()> {
        if self.list {
            list_codemods();
            return Ok(());
        }

        let engine = match &self.since {
            Some(version) => CodemodEngine::since(version)?,
            None => CodemodEngine::new(),
        };
        if engine.codemods().is_empty() {
            println!("No codemods to apply");
            return Ok(());
        }

        let files = context.workflow_files(&self.workflows)?;
        let mut changed = 0;
        let mut unreadable = 0;
        for path in &files {
            let display = context.display_path(path);
            let run = match read_text(path).and_then(|content| engine.apply(&content, path)) {
                Ok(run) => run,
                Err(error) => {
                    unreadable += 1;
                    println!("{} {display}", "✗".red());
                    user_friendly_error(error.into()).display();
                    continue;
                }
            };

            for failure in run.failures() {
                if let Some(error) = &failure.error {
                    println!("{} {display}: {} failed: {error}", "!".yellow(), failure.id);
                }
            }

            let applied = run.applied_ids();
            if applied.is_empty() {
                continue;
            }
            changed += 1;
            if self.write {
                safe_write(path, &run.content)?;
                println!("{} {display}: {}", "Fixed".green(), applied.join(", "));
            } else {
                println!("{} {display}: {}", "Would fix".yellow(), applied.join(", "));
            }
        }

        match (changed, self.write) {
            (0, _) => println!("{}", "No workflows need fixing".green()),
            (n, true) => println!("Fixed {n} workflow(s)"),
            (n, false) => println!("{n} workflow(s) would change; re-run with --write to apply"),
        }

        if unreadable > 0 {
            return Err(anyhow!("{unreadable} workflow(s) could not be parsed"));
        }
        Ok(())
    }
}

fn list_codemods() {
    println!("{:<28} {:<10} Description", "ID", "Since");
    println!("{}", "─".repeat(80));
    for codemod in registry() {
        println!("{:<28} {:<10} {}", codemod.id.cyan(), codemod.introduced_in, codemod.description);
    }
}
