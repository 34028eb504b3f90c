//! Frontmatter splitting and parsing.
//!
//! A workflow document may start with a YAML frontmatter block: a line that is
//! exactly `---`, the YAML text, and another line that is exactly `---`. This
//! module finds that block byte-exactly (so the body can be reproduced without
//! changes), parses it into an order-preserving [`Frontmatter`] tree, and maps
//! YAML parser positions back onto lines of the original document.
//!
//! # Example
//!
//! ```rust
//! use awf_cli::markdown::frontmatter::FrontmatterParser;
//! use std::path::Path;
//!
//! let content = "---\non: push\nimports:\n  - shared/tools.md\n---\n# Task\n";
//! let parsed = FrontmatterParser::parse(content, Path::new("w.md")).unwrap();
//!
//! assert_eq!(parsed.frontmatter_line_offset, 2);
//! assert_eq!(parsed.body, "# Task\n");
//! assert!(parsed.frontmatter.unwrap().contains_key("imports"));
//! ```

use regex::{Captures, Regex};
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

use crate::core::{AwfError, render_source_excerpt};

/// A parsed frontmatter mapping. Keys keep their declaration order.
pub type Frontmatter = serde_json::Map<String, Value>;

/// Matches position references produced by the YAML parser.
static LINE_COLUMN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"line (\d+) column (\d+)").ok());

/// Byte boundaries of the frontmatter block in the original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterBoundaries {
    /// Byte position where the YAML text starts (after the opening `---` line).
    pub content_start: usize,
    /// Byte position where the YAML text ends (start of the closing `---` line).
    pub content_end: usize,
    /// Byte position where the body starts (after the closing `---` line).
    pub body_start: usize,
}

/// Result of splitting and parsing a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrontmatter {
    /// Parsed frontmatter, or `None` when the document has no block.
    pub frontmatter: Option<Frontmatter>,
    /// Raw YAML text between the delimiters.
    pub raw_frontmatter: Option<String>,
    /// Markdown body, byte-identical to the original.
    pub body: String,
    /// 1-based line where the YAML text begins in the original document.
    pub frontmatter_line_offset: usize,
    /// Byte boundaries of the block, if present.
    pub boundaries: Option<FrontmatterBoundaries>,
}

impl ParsedFrontmatter {
    /// Check if frontmatter was present in the original content.
    pub fn has_frontmatter(&self) -> bool {
        self.boundaries.is_some()
    }
}

/// Stateless frontmatter parser.
pub struct FrontmatterParser;

impl FrontmatterParser {
    /// Locate the frontmatter block.
    ///
    /// The first line must be exactly `---` (a trailing `\r` is tolerated) and
    /// a later line must be exactly `---` as well. Without a closing line the
    /// document is treated as having no frontmatter.
    pub fn boundaries(content: &str) -> Option<FrontmatterBoundaries> {
        let first_end = content.find('\n')?;
        if !is_delimiter(&content[..first_end]) {
            return None;
        }

        let content_start = first_end + 1;
        let mut pos = content_start;
        while pos <= content.len() {
            let line_end = content[pos..].find('\n').map_or(content.len(), |i| pos + i);
            if is_delimiter(&content[pos..line_end]) {
                let body_start = if line_end < content.len() {
                    line_end + 1
                } else {
                    line_end
                };
                return Some(FrontmatterBoundaries {
                    content_start,
                    content_end: pos,
                    body_start,
                });
            }
            if line_end >= content.len() {
                break;
            }
            pos = line_end + 1;
        }
        None
    }

    /// Split `content` into raw frontmatter text and body without parsing.
    pub fn split(content: &str) -> (Option<&str>, &str) {
        match Self::boundaries(content) {
            Some(b) => (Some(&content[b.content_start..b.content_end]), &content[b.body_start..]),
            None => (None, content),
        }
    }

    /// Split and parse a document.
    ///
    /// # Errors
    ///
    /// Returns [`AwfError::Syntax`] when the YAML is malformed or is not a
    /// mapping. Line and column refer to the original document and the error
    /// carries a rendered excerpt.
    pub fn parse(content: &str, file: &Path) -> Result<ParsedFrontmatter, AwfError> {
        let Some(boundaries) = Self::boundaries(content) else {
            return Ok(ParsedFrontmatter {
                frontmatter: None,
                raw_frontmatter: None,
                body: content.to_string(),
                frontmatter_line_offset: 0,
                boundaries: None,
            });
        };

        // The YAML text always starts on the line after the opening delimiter
        let line_offset = 2;
        let raw = &content[boundaries.content_start..boundaries.content_end];
        let frontmatter = Self::parse_yaml(raw, content, line_offset, file)?;

        Ok(ParsedFrontmatter {
            frontmatter: Some(frontmatter),
            raw_frontmatter: Some(raw.to_string()),
            body: content[boundaries.body_start..].to_string(),
            frontmatter_line_offset: line_offset,
            boundaries: Some(boundaries),
        })
    }

    /// Parse raw YAML frontmatter text into a mapping.
    ///
    /// `document` is the full original text used for the error excerpt and
    /// `line_offset` is the 1-based document line of the first YAML line.
    pub fn parse_yaml(
        raw: &str,
        document: &str,
        line_offset: usize,
        file: &Path,
    ) -> Result<Frontmatter, AwfError> {
        if raw.trim().is_empty() {
            return Ok(Frontmatter::new());
        }

        match serde_yaml::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(Frontmatter::new()),
            Ok(other) => Err(AwfError::Syntax {
                file: file.display().to_string(),
                line: line_offset,
                column: 1,
                message: format!("frontmatter must be a mapping, found {}", json_type_name(&other)),
                excerpt: render_source_excerpt(document, line_offset, 1),
            }),
            Err(e) => {
                let (line, column) = e
                    .location()
                    .map_or((line_offset, 1), |loc| (loc.line() + line_offset - 1, loc.column()));
                Err(AwfError::Syntax {
                    file: file.display().to_string(),
                    line,
                    column,
                    message: shift_line_references(&e.to_string(), line_offset),
                    excerpt: render_source_excerpt(document, line, column),
                })
            }
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == "---"
}

/// Rewrite `line N column M` references from frontmatter-relative to document lines.
fn shift_line_references(message: &str, line_offset: usize) -> String {
    let Some(re) = LINE_COLUMN.as_ref() else {
        return message.to_string();
    };
    re.replace_all(message, |caps: &Captures<'_>| {
        let line: usize = caps[1].parse().unwrap_or(1);
        format!("line {} column {}", line + line_offset - 1, &caps[2])
    })
    .into_owned()
}

/// Human-readable JSON type name.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
