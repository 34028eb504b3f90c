//! Update pinned GitHub Actions.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::actions::{
    ActionVersionResolver, UpdateReport, update_lock_file, update_workflow_files,
};
use crate::core::OperationContext;
use crate::lockfile::ActionLockFile;

use super::common::CommandContext;

/// Move every action in the actions lock file to its newest compatible
/// release and rewrite the workflows that use it.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Allow moving to a new major version
    ///
    /// Core actions (`actions/*`) always move to the newest major.
    #[arg(long)]
    major: bool,

    /// Only update the lock file, leave workflow files alone
    #[arg(long)]
    no_workflows: bool,
}

impl UpdateCommand {
    /// Execute the command.
    ///
    /// Actions that cannot be checked are reported; they do not fail the
    /// command.
    pub async fn execute(self, context: &CommandContext, ctx: &OperationContext) -> Result<()> {
        let lock_path = context.actions_lock();
        let mut lock = ActionLockFile::load(&lock_path)?;
        if lock.is_empty() {
            println!("No actions pinned in {}", context.display_path(&lock_path));
            return Ok(());
        }

        let remote = context.remote();
        let git = context.git();
        let mut resolver = ActionVersionResolver::new(&remote, &git);
        let report = update_lock_file(&mut resolver, ctx, &mut lock, self.major).await?;

        if report.has_changes() {
            lock.save(&lock_path)?;
            if !self.no_workflows {
                for path in update_workflow_files(&context.workflows_dir(), &report.updated)? {
                    println!("{} {}", "Rewrote".green(), context.display_path(&path));
                }
            }
        }

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &UpdateReport) {
    if !report.updated.is_empty() {
        println!("{}", "Updated:".bold());
        for change in &report.updated {
            println!(
                "  {} {} -> {}",
                change.repo,
                change.from_version.yellow(),
                change.to_version.green()
            );
        }
    }
    if !report.up_to_date.is_empty() {
        println!("{}", "Up to date:".bold());
        for key in &report.up_to_date {
            println!("  {key}");
        }
    }
    if !report.failed.is_empty() {
        println!("{}", "Failed to check:".bold());
        for (key, error) in &report.failed {
            println!("  {} {}", key.red(), error);
        }
    }
}
