//! Markdown workflow documents.
//!
//! An agentic workflow is a markdown file with an optional YAML frontmatter
//! block that configures the job, followed by the markdown prompt:
//!
//! ```markdown
//! ---
//! on: issues
//! engine: copilot
//! imports:
//!   - shared/tools.md
//!   - path: shared/reviewer.md
//!     inputs:
//!       language: rust
//! ---
//!
//! # Triage
//!
//! Label the issue.
//! ```
//!
//! # Modules
//!
//! - [`frontmatter`] - byte-exact splitting and order-preserving YAML parsing
//! - [`section`] - `#Section` extraction for section-qualified imports
//!
//! Documents are read-only once loaded; rewriting tools (codemods, action
//! updates) work on the raw text and re-parse when needed.

pub mod frontmatter;
pub mod section;

use regex::{Captures, Regex};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::core::AwfError;
use crate::utils::fs::read_text;

pub use frontmatter::{Frontmatter, FrontmatterBoundaries, FrontmatterParser, ParsedFrontmatter};
pub use section::extract_section;

/// `${{ github.aw.inputs.<name> }}` placeholders in imported bodies.
static INPUT_PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\$\{\{\s*github\.aw\.inputs\.([A-Za-z0-9_-]+)\s*\}\}").ok()
});

/// A loaded workflow markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Full original text.
    pub content: String,
    /// Parsed frontmatter (`None` when the document has no block).
    pub frontmatter: Option<Frontmatter>,
    /// Raw YAML text of the frontmatter block.
    pub raw_frontmatter: Option<String>,
    /// Markdown body after the frontmatter.
    pub body: String,
    /// 1-based line where the YAML text begins.
    pub frontmatter_line_offset: usize,
}

impl WorkflowDocument {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self, AwfError> {
        let content = read_text(path)?;
        Self::parse(path, content)
    }

    /// Parse a document from already-read text.
    pub fn parse(path: &Path, content: String) -> Result<Self, AwfError> {
        let parsed = FrontmatterParser::parse(&content, path)?;
        Ok(Self {
            path: path.to_path_buf(),
            frontmatter: parsed.frontmatter,
            raw_frontmatter: parsed.raw_frontmatter,
            body: parsed.body,
            frontmatter_line_offset: parsed.frontmatter_line_offset,
            content,
        })
    }

    /// Frontmatter mapping, or an empty one when the document has none.
    pub fn frontmatter_or_empty(&self) -> Frontmatter {
        self.frontmatter.clone().unwrap_or_default()
    }

    /// Directory imports are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

/// Whether `path` names a custom agent file (`.github/agents/*.md`).
///
/// Separators are normalized so the check works for remote sub-paths and
/// Windows paths alike.
pub fn is_custom_agent_path(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    let anchored = if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{normalized}")
    };
    anchored.contains(crate::constants::AGENTS_DIR_MARKER) && anchored.ends_with(".md")
}

/// Replace `${{ github.aw.inputs.<name> }}` placeholders with input values.
///
/// Strings are inserted verbatim, other scalars use their JSON rendering and
/// structured values are inserted as compact JSON. Placeholders naming an
/// unknown input are left untouched.
pub fn substitute_inputs(body: &str, inputs: &serde_json::Map<String, Value>) -> String {
    if inputs.is_empty() {
        return body.to_string();
    }
    let Some(re) = INPUT_PLACEHOLDER.as_ref() else {
        return body.to_string();
    };
    re.replace_all(body, |caps: &Captures<'_>| match inputs.get(&caps[1]) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
        None => caps[0].to_string(),
    })
    .into_owned()
}
