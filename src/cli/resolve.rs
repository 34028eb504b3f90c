//! Resolve a workflow's imports and print the merged result.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

use crate::core::OperationContext;
use crate::resolver::ImportResolver;

use super::common::CommandContext;

/// Print the merged imports of one workflow as JSON.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Workflow path or name under the workflows directory
    workflow: String,

    /// Print compact JSON on one line
    #[arg(long)]
    compact: bool,
}

impl ResolveCommand {
    /// Execute the command.
    pub async fn execute(self, context: &CommandContext, ctx: &OperationContext) -> Result<()> {
        let path = context.locate_workflow(&self.workflow)?;
        let mut resolver = ImportResolver::new(Arc::new(context.remote()));
        let result = resolver.resolve_file(&path, ctx).await?;
        tracing::info!(
            "Resolved {} imports of {} ({} remote fetches)",
            result.imported_files.len(),
            context.display_path(&path),
            resolver.fetch_count()
        );

        let json = if self.compact {
            serde_json::to_string(&result)
        } else {
            serde_json::to_string_pretty(&result)
        }
        .context("Failed to serialize import result")?;
        println!("{json}");
        Ok(())
    }
}
