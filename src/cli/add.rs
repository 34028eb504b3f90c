//! Add a workflow from a remote repository.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::Path;

use crate::codemods::lines::{FrontmatterLines, parse_key_line};
use crate::core::{AwfError, OperationContext};
use crate::github::RemoteFetcher;
use crate::markdown::WorkflowDocument;
use crate::resolver::import_spec::{ImportReference, WorkflowSpec};
use crate::utils::fs::safe_write;

use super::common::CommandContext;

/// Copy a workflow from `owner/repo/path@ref` into the workflows directory.
///
/// The copy records where it came from in a top-level `source:` field.
#[derive(Args, Debug)]
pub struct AddCommand {
    /// Workflowspec of the workflow to add (`owner/repo/path.md[@ref]`)
    spec: String,

    /// File name for the copy (defaults to the remote file name)
    #[arg(long)]
    name: Option<String>,

    /// Overwrite an existing workflow with the same name
    #[arg(long)]
    force: bool,
}

impl AddCommand {
    /// Execute the command.
    pub async fn execute(self, context: &CommandContext, ctx: &OperationContext) -> Result<()> {
        let spec = parse_workflow_spec(&self.spec)?;
        let name = self.name.as_deref().unwrap_or_else(|| spec.file_name());
        let name = name.strip_suffix(".md").unwrap_or(name);
        let target = context.workflows_dir().join(format!("{name}.md"));
        if target.exists() && !self.force {
            return Err(anyhow!(
                "Workflow {} already exists; use --force to overwrite it",
                context.display_path(&target)
            ));
        }

        ctx.checkpoint()?;
        let bytes = context
            .remote()
            .fetch_file(&spec.owner, &spec.repo, &spec.git_ref, &spec.path)
            .await?;
        let content = String::from_utf8(bytes)
            .with_context(|| format!("{spec} is not valid UTF-8 text"))?;
        // Refuse to install something that does not parse
        WorkflowDocument::parse(Path::new(&spec.path), content.clone())?;

        let content = set_source_field(&content, &spec.to_string());
        safe_write(&target, &content)?;
        println!("{} {} from {spec}", "Added".green(), context.display_path(&target));
        Ok(())
    }
}

/// Parse a command-line workflowspec, requiring a remote file reference.
fn parse_workflow_spec(spec: &str) -> Result<WorkflowSpec, AwfError> {
    match ImportReference::parse(spec) {
        ImportReference::Remote(spec) if spec.section.is_none() => Ok(spec),
        _ => Err(AwfError::Config {
            message: format!("'{spec}' is not a workflowspec of the form owner/repo/path.md[@ref]"),
        }),
    }
}

/// Set the top-level `source:` field, adding a frontmatter block when the
/// document has none.
fn set_source_field(content: &str, source: &str) -> String {
    let source_line = format!("source: {source}");
    let Some(mut lines) = FrontmatterLines::split(content) else {
        return format!("---\n{source_line}\n---\n{content}");
    };

    let existing = lines.lines.iter().position(|line| {
        parse_key_line(line).is_some_and(|key| key.prefix.is_empty() && key.key == "source")
    });
    match existing {
        Some(index) => lines.lines[index] = source_line,
        None => lines.lines.push(source_line),
    }
    lines.render()
}
