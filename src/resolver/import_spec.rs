//! Import entries and import reference classification.
//!
//! An `imports` entry is either a plain string or a mapping with a `path`
//! and optional `inputs`. The path itself is one of:
//!
//! - a local path relative to the importing file (`shared/tools.md`)
//! - a section-qualified local path (`shared/guide.md#Review`)
//! - a remote workflowspec (`owner/repo/path/file.md@v1`)
//! - a repository-only spec (`owner/repo@v1`)

use serde_json::{Map, Value};
use std::fmt;

use crate::constants::DEFAULT_REF;
use crate::core::AwfError;
use crate::utils::path_validation::{clean_relative_path, join_within_base};

/// One entry of an `imports` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Reference as written.
    pub path: String,
    /// Compile-time inputs for the imported file.
    pub inputs: Map<String, Value>,
}

impl ImportSpec {
    /// Create a spec without inputs.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            inputs: Map::new(),
        }
    }

    /// Parse the `imports` field of a frontmatter.
    ///
    /// A single string is accepted as a one-element list.
    ///
    /// # Errors
    ///
    /// [`AwfError::InvalidImport`] for entries that are neither strings nor
    /// mappings with a string `path`, and for non-mapping `inputs`.
    pub fn parse_list(value: &Value, file: &str) -> Result<Vec<Self>, AwfError> {
        let invalid = |reason: String| AwfError::InvalidImport {
            file: file.to_string(),
            reason,
        };

        let items = match value {
            Value::Null => return Ok(Vec::new()),
            Value::String(s) => return Ok(vec![Self::new(s.trim())]),
            Value::Array(items) => items,
            other => {
                return Err(invalid(format!(
                    "'imports' must be a list, found {}",
                    crate::markdown::frontmatter::json_type_name(other)
                )));
            }
        };

        let mut specs = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(s) if !s.trim().is_empty() => specs.push(Self::new(s.trim())),
                Value::Object(map) => {
                    let path = match map.get("path") {
                        Some(Value::String(p)) if !p.trim().is_empty() => p.trim().to_string(),
                        _ => {
                            return Err(invalid(format!(
                                "import #{} must have a non-empty string 'path'",
                                index + 1
                            )));
                        }
                    };
                    let inputs = match map.get("inputs") {
                        None | Some(Value::Null) => Map::new(),
                        Some(Value::Object(inputs)) => inputs.clone(),
                        Some(_) => {
                            return Err(invalid(format!(
                                "'inputs' of import '{path}' must be a mapping"
                            )));
                        }
                    };
                    specs.push(Self {
                        path,
                        inputs,
                    });
                }
                other => {
                    return Err(invalid(format!(
                        "import #{} must be a string or a mapping, found {}",
                        index + 1,
                        crate::markdown::frontmatter::json_type_name(other)
                    )));
                }
            }
        }
        Ok(specs)
    }
}

/// A remote file reference `owner/repo/path@ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowSpec {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// File path inside the repository
    pub path: String,
    /// Git ref (branch, tag or commit)
    pub git_ref: String,
    /// Optional `#Section` qualifier
    pub section: Option<String>,
}

impl WorkflowSpec {
    /// Directory of [`Self::path`] inside the repository (empty at the root).
    pub fn base_path(&self) -> String {
        self.path.rsplit_once('/').map(|(dir, _)| dir.to_string()).unwrap_or_default()
    }

    /// Origin that nested relative imports of this file are anchored at.
    pub fn origin(&self) -> RemoteOrigin {
        RemoteOrigin {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            git_ref: self.git_ref.clone(),
            base_path: self.base_path(),
        }
    }

    /// File name component of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for WorkflowSpec {
    /// Canonical `owner/repo/path@ref` form (without section).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{}", self.owner, self.repo, self.path, self.git_ref)
    }
}

/// Where a remotely fetched file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrigin {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Ref the parent was fetched at
    pub git_ref: String,
    /// Directory of the parent inside the repository
    pub base_path: String,
}

impl RemoteOrigin {
    /// Rewrite a nested relative import as a workflowspec on this origin.
    ///
    /// # Errors
    ///
    /// [`AwfError::PathEscape`] when `nested` is absolute or climbs out of
    /// the base path.
    pub fn nest(&self, nested: &str, section: Option<&str>) -> Result<WorkflowSpec, AwfError> {
        let path = join_within_base(&self.base_path, nested)?;
        Ok(WorkflowSpec {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            path,
            git_ref: self.git_ref.clone(),
            section: section.map(str::to_string),
        })
    }
}

/// Classified import reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReference {
    /// `owner/repo[@ref]` without a file path.
    RepositoryOnly {
        /// The spec as written
        spec: String,
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
        /// Optional ref
        git_ref: Option<String>,
    },
    /// Remote file.
    Remote(WorkflowSpec),
    /// File relative to the importing document.
    Local {
        /// Path without section qualifier
        path: String,
        /// Optional `#Section` qualifier
        section: Option<String>,
    },
}

impl ImportReference {
    /// Classify an import path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use awf_cli::resolver::import_spec::ImportReference;
    ///
    /// let remote = ImportReference::parse("octo/tools/shared/lint.md@v2");
    /// assert!(matches!(remote, ImportReference::Remote(spec) if spec.git_ref == "v2"));
    ///
    /// let local = ImportReference::parse("shared/review.md#Checklist");
    /// assert!(matches!(local, ImportReference::Local { section: Some(_), .. }));
    /// ```
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let (without_section, section) = match reference.split_once('#') {
            Some((path, section)) if !section.trim().is_empty() => {
                (path, Some(section.trim().to_string()))
            }
            Some((path, _)) => (path, None),
            None => (reference, None),
        };

        let (path, git_ref) = match without_section.rsplit_once('@') {
            Some((path, git_ref)) if !git_ref.is_empty() => (path, Some(git_ref.to_string())),
            _ => (without_section, None),
        };

        let local_prefix =
            path.starts_with('.') || path.starts_with('/') || path.starts_with("shared/");
        let segments: Vec<&str> = path.split('/').collect();

        if !local_prefix
            && segments.len() >= 3
            && segments.iter().all(|s| !s.is_empty())
            && segments[..2].iter().all(|s| is_valid_repo_segment(s))
        {
            return Self::Remote(WorkflowSpec {
                owner: segments[0].to_string(),
                repo: segments[1].to_string(),
                path: clean_relative_path(&segments[2..].join("/")),
                git_ref: git_ref.unwrap_or_else(|| DEFAULT_REF.to_string()),
                section,
            });
        }

        if !local_prefix
            && section.is_none()
            && segments.len() == 2
            && segments.iter().all(|s| is_valid_repo_segment(s))
            && !has_source_extension(segments[1])
        {
            return Self::RepositoryOnly {
                spec: reference.to_string(),
                owner: segments[0].to_string(),
                repo: segments[1].to_string(),
                git_ref,
            };
        }

        Self::Local {
            path: without_section.to_string(),
            section,
        }
    }

    /// Section qualifier, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Remote(spec) => spec.section.as_deref(),
            Self::Local {
                section,
                ..
            } => section.as_deref(),
            Self::RepositoryOnly {
                ..
            } => None,
        }
    }
}

fn is_valid_repo_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn has_source_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".yml") || lower.ends_with(".yaml")
}

/// Locate an import reference inside raw frontmatter text.
///
/// Returns the 1-based `(line, column)` in the original document of the
/// first occurrence of `reference` after the `imports:` key, falling back to
/// the key itself or the start of the frontmatter.
pub fn locate_reference(
    raw_frontmatter: &str,
    line_offset: usize,
    reference: &str,
) -> (usize, usize) {
    let mut in_imports = false;
    let mut imports_line = None;
    for (index, line) in raw_frontmatter.lines().enumerate() {
        let trimmed = line.trim_start();
        if !in_imports {
            if line.starts_with("imports:") {
                in_imports = true;
                imports_line = Some(index);
                if let Some(col) = line.find(reference) {
                    return (line_offset + index, col + 1);
                }
            }
            continue;
        }
        if !line.starts_with([' ', '\t', '-']) && !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
        if let Some(col) = line.find(reference) {
            return (line_offset + index, col + 1);
        }
    }
    match imports_line {
        Some(index) => (line_offset + index, 1),
        None => (line_offset.max(1), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list_shapes() {
        let value = json!(["a.md", {"path": "b.md", "inputs": {"x": 1}}]);
        let specs = ImportSpec::parse_list(&value, "w.md").unwrap();
        assert_eq!(specs[0], ImportSpec::new("a.md"));
        assert_eq!(specs[1].path, "b.md");
        assert_eq!(specs[1].inputs.get("x"), Some(&json!(1)));

        assert_eq!(ImportSpec::parse_list(&json!("one.md"), "w.md").unwrap().len(), 1);
        assert!(ImportSpec::parse_list(&Value::Null, "w.md").unwrap().is_empty());
    }

    #[test]
    fn test_parse_list_rejects_bad_items() {
        for bad in [json!([1]), json!([{"inputs": {}}]), json!([{"path": "a.md", "inputs": [1]}]), json!(5)]
        {
            let err = ImportSpec::parse_list(&bad, "w.md").unwrap_err();
            assert!(matches!(err, AwfError::InvalidImport { .. }), "{bad}");
        }
    }

    #[test]
    fn test_classify_remote() {
        let ImportReference::Remote(spec) = ImportReference::parse("owner/repo/dir/F.md@v1") else {
            panic!("expected remote");
        };
        assert_eq!(spec.owner, "owner");
        assert_eq!(spec.path, "dir/F.md");
        assert_eq!(spec.base_path(), "dir");
        assert_eq!(spec.to_string(), "owner/repo/dir/F.md@v1");

        let ImportReference::Remote(spec) = ImportReference::parse("o/r/F.md#Tools") else {
            panic!("expected remote");
        };
        assert_eq!(spec.git_ref, "main");
        assert_eq!(spec.section.as_deref(), Some("Tools"));
        assert_eq!(spec.base_path(), "");

        let ImportReference::Remote(spec) = ImportReference::parse("o/r/a/./b/../F.md") else {
            panic!("expected remote");
        };
        assert_eq!(spec.path, "a/F.md");
        let ImportReference::Remote(spec) = ImportReference::parse("o/r/../../F.md@v1") else {
            panic!("expected remote");
        };
        assert_eq!(spec.path, "../../F.md");
    }

    #[test]
    fn test_classify_local_and_repository() {
        assert_eq!(
            ImportReference::parse("shared/a/b.md"),
            ImportReference::Local {
                path: "shared/a/b.md".to_string(),
                section: None
            }
        );
        assert!(matches!(ImportReference::parse("../x/y/z.md"), ImportReference::Local { .. }));
        assert!(matches!(ImportReference::parse("tools.md"), ImportReference::Local { .. }));
        assert!(matches!(ImportReference::parse("shared/tools.md"), ImportReference::Local { .. }));
        assert!(matches!(ImportReference::parse("docs/../x.md"), ImportReference::Local { .. }));
        assert!(matches!(
            ImportReference::parse("octo/agents@v2"),
            ImportReference::RepositoryOnly { git_ref: Some(r), .. } if r == "v2"
        ));
        assert!(matches!(
            ImportReference::parse("octo/agents"),
            ImportReference::RepositoryOnly { git_ref: None, .. }
        ));
    }

    #[test]
    fn test_origin_nesting() {
        let ImportReference::Remote(spec) = ImportReference::parse("owner/repo/dir/F.md@v1") else {
            panic!("expected remote");
        };
        let nested = spec.origin().nest("G.md", None).unwrap();
        assert_eq!(nested.to_string(), "owner/repo/dir/G.md@v1");
        assert!(spec.origin().nest("../G.md", None).is_err());
    }

    #[test]
    fn test_locate_reference() {
        let raw = "on: push\nimports:\n  - shared/a.md\n  - path: shared/b.md\ntools: {}\n";
        assert_eq!(locate_reference(raw, 2, "shared/a.md"), (4, 5));
        assert_eq!(locate_reference(raw, 2, "shared/b.md"), (5, 11));
        assert_eq!(locate_reference(raw, 2, "missing.md"), (3, 1));
    }
}
