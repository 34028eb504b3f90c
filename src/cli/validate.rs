//! Validate workflows: frontmatter syntax, schema conformance and imports.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::core::{AwfError, OperationContext, user_friendly_error};
use crate::markdown::WorkflowDocument;
use crate::resolver::ImportResolver;
use crate::schema::SchemaValidator;

use super::common::CommandContext;

/// Check workflows for problems without modifying them.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Workflows to check (every workflow when omitted)
    workflows: Vec<String>,

    /// Skip import resolution
    #[arg(long)]
    no_imports: bool,
}

impl ValidateCommand {
    /// Execute the command.
    ///
    /// Every workflow is checked and every problem printed before failing.
    pub async fn execute(self, context: &CommandContext, ctx: &OperationContext) -> Result<()> {
        let files = context.workflow_files(&self.workflows)?;
        let schema = SchemaValidator::main_workflow()?;
        let mut resolver = ImportResolver::new(Arc::new(context.remote()));

        let mut failed = 0;
        for path in &files {
            ctx.checkpoint()?;
            let display = context.display_path(path);
            let errors = self.check(path, schema, &mut resolver, ctx).await?;
            if errors.is_empty() {
                println!("{} {display}", "✓".green());
                continue;
            }
            failed += 1;
            println!("{} {display}", "✗".red());
            for error in errors {
                user_friendly_error(error.into()).display();
            }
        }

        if failed > 0 {
            return Err(anyhow!("{failed} of {} workflow(s) failed validation", files.len()));
        }
        println!("{}", format!("All {} workflow(s) are valid", files.len()).green());
        Ok(())
    }

    /// Problems found in one workflow. Only cancellation is returned as `Err`.
    async fn check(
        &self,
        path: &Path,
        schema: &SchemaValidator,
        resolver: &mut ImportResolver,
        ctx: &OperationContext,
    ) -> Result<Vec<AwfError>, AwfError> {
        let document = match WorkflowDocument::load(path) {
            Ok(document) => document,
            Err(error) => return Ok(vec![error]),
        };

        let mut errors = schema.validate_all(
            &document.frontmatter_or_empty(),
            &path.display().to_string(),
            document.raw_frontmatter.as_deref(),
            document.frontmatter_line_offset,
        );

        if !self.no_imports {
            match resolver.resolve(&document, ctx).await {
                Ok(_) => {}
                Err(AwfError::Cancelled) => return Err(AwfError::Cancelled),
                Err(error) => errors.push(error),
            }
        }
        Ok(errors)
    }
}
