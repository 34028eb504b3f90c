//! Frontmatter import resolution.
//!
//! Resolving a workflow walks its `imports` breadth-first, materializes each
//! referenced file (locally or from GitHub), harvests the fields the compiler
//! needs, and folds them into one [`ImportsResult`].
//!
//! # Traversal
//!
//! 1. The root workflow's `imports` seed a FIFO queue. The root itself is a
//!    graph node and is marked visited before anything is enqueued.
//! 2. Each dequeued file is handled by kind:
//!    - **custom agent** (`.github/agents/*.md`): recorded as the single
//!      agent; its body is inlined when inputs are present, otherwise kept as
//!      a runtime import
//!    - **YAML workflow** (`.yml`/`.yaml`): `jobs` and `services` are
//!      harvested, nothing else
//!    - **markdown**: fields are harvested and nested imports are enqueued
//! 3. Every import relationship becomes an edge, including edges to files
//!    already visited, so that cycles surface during ordering.
//! 4. After the queue drains, a topological sort with lexicographic
//!    tie-breaking produces `imported_files` (root last). A cycle aborts the
//!    whole resolution with [`AwfError::CircularImport`].
//!
//! Nested relative imports inside remotely fetched files are rewritten as
//! workflowspecs on the same repository and ref, anchored at the parent's
//! directory. Paths escaping that directory are rejected.
//!
//! # Modules
//!
//! - [`import_spec`] - `imports` entries and reference classification
//! - [`path_resolver`] - local lookup and cached remote materialization
//! - [`field_extractor`] - per-file harvesting
//! - [`accumulator`] - deterministic merge into [`ImportsResult`]
//! - [`import_graph`] - ordering and cycle detection

pub mod accumulator;
pub mod field_extractor;
pub mod import_graph;
pub mod import_spec;
pub mod path_resolver;

use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{AwfError, OperationContext};
use crate::github::RemoteFetcher;
use crate::markdown::frontmatter::{Frontmatter, FrontmatterParser};
use crate::markdown::{WorkflowDocument, extract_section, is_custom_agent_path, substitute_inputs};
use crate::schema::SchemaValidator;
use crate::utils::fs::read_text;

pub use accumulator::{ImportAccumulator, ImportsResult};
pub use field_extractor::{ExtractedFields, FieldExtractor, PluginSpec};
pub use import_graph::ImportGraph;
pub use import_spec::{ImportReference, ImportSpec, RemoteOrigin, WorkflowSpec};
pub use path_resolver::{ImportSite, PathResolver};

/// How a dequeued file is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportKind {
    Agent,
    YamlWorkflow,
    Markdown,
}

/// One unit of traversal work.
#[derive(Debug, Clone)]
struct ImportQueueItem {
    /// Reference as written, or the rewritten workflowspec for nested
    /// imports of remote files
    import_path: String,
    /// Materialized file on disk
    full_path: PathBuf,
    /// Graph node name
    display: String,
    section: Option<String>,
    /// Directory local nested imports resolve against
    base_dir: PathBuf,
    inputs: Map<String, Value>,
    remote_origin: Option<RemoteOrigin>,
    /// Where the reference was written
    site: ImportSite,
}

/// The importing side of an import relationship.
struct Parent<'a> {
    display: &'a str,
    base_dir: &'a Path,
    remote_origin: Option<&'a RemoteOrigin>,
    raw_frontmatter: &'a str,
    line_offset: usize,
}

/// Resolves a workflow's imports. One instance serves one invocation; its
/// remote cache is not shared.
pub struct ImportResolver {
    paths: PathResolver,
}

impl ImportResolver {
    /// Create a resolver fetching remote imports through `fetcher`.
    pub fn new(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            paths: PathResolver::new(fetcher),
        }
    }

    /// Number of remote files fetched so far.
    pub fn fetch_count(&self) -> usize {
        self.paths.fetch_count()
    }

    /// Load `path` and resolve its imports.
    pub async fn resolve_file(
        &mut self,
        path: &Path,
        ctx: &OperationContext,
    ) -> Result<ImportsResult, AwfError> {
        ctx.checkpoint()?;
        let root = WorkflowDocument::load(path)?;
        self.resolve(&root, ctx).await
    }

    /// Resolve the imports of an already-loaded workflow.
    ///
    /// # Errors
    ///
    /// Fails on the first unresolvable import (with the reference's location
    /// in its parent), on a cycle, on conflicting agents, on a missing
    /// required input, and with [`AwfError::Cancelled`] when `ctx` is
    /// cancelled. A failed resolution discards all partial results.
    pub async fn resolve(
        &mut self,
        root: &WorkflowDocument,
        ctx: &OperationContext,
    ) -> Result<ImportsResult, AwfError> {
        let root_dir = root.base_dir();
        let root_dir = root_dir.canonicalize().unwrap_or(root_dir);
        let root_display = root
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.path.display().to_string());

        let mut traversal = Traversal {
            root_dir: root_dir.clone(),
            queue: VecDeque::new(),
            visited: HashSet::from([root_display.clone()]),
            graph: ImportGraph::new(),
            accumulator: ImportAccumulator::new(),
            processed: Vec::new(),
        };
        traversal.graph.ensure_node(&root_display);

        let frontmatter = root.frontmatter_or_empty();
        if let Some(imports) = frontmatter.get("imports") {
            let specs = ImportSpec::parse_list(imports, &root_display)?;
            let parent = Parent {
                display: &root_display,
                base_dir: &root_dir,
                remote_origin: None,
                raw_frontmatter: root.raw_frontmatter.as_deref().unwrap_or_default(),
                line_offset: root.frontmatter_line_offset,
            };
            traversal.enqueue(&mut self.paths, &parent, specs, ctx).await?;
        }

        loop {
            ctx.checkpoint()?;
            let Some(item) = traversal.queue.pop_front() else {
                break;
            };
            traversal.process(&mut self.paths, item, ctx).await?;
        }

        tracing::debug!(
            target: "resolver",
            "Processed {} imports for {root_display}",
            traversal.processed.len()
        );

        let order = traversal.graph.topological_order().map_err(|chain| {
            AwfError::CircularImport {
                chain,
                workflow_file: root.path.display().to_string(),
            }
        })?;
        Ok(traversal.accumulator.finish(order))
    }
}

/// Mutable state of one traversal.
struct Traversal {
    root_dir: PathBuf,
    queue: VecDeque<ImportQueueItem>,
    visited: HashSet<String>,
    graph: ImportGraph,
    accumulator: ImportAccumulator,
    processed: Vec<String>,
}

impl Traversal {
    /// Resolve `specs` declared by `parent` and enqueue the unvisited ones.
    async fn enqueue(
        &mut self,
        paths: &mut PathResolver,
        parent: &Parent<'_>,
        specs: Vec<ImportSpec>,
        ctx: &OperationContext,
    ) -> Result<(), AwfError> {
        for spec in specs {
            let (line, column) = import_spec::locate_reference(
                parent.raw_frontmatter,
                parent.line_offset,
                &spec.path,
            );
            let site = ImportSite {
                file: parent.display.to_string(),
                line,
                column,
            };

            let reference = match (ImportReference::parse(&spec.path), parent.remote_origin) {
                (
                    ImportReference::Local {
                        path,
                        section,
                    },
                    Some(origin),
                ) => origin
                    .nest(&path, section.as_deref())
                    .map(ImportReference::Remote)
                    .map_err(|e| import_error(e, &spec.path, &site))?,
                (reference, _) => reference,
            };

            let (import_path, full_path, node, remote_origin) = match &reference {
                ImportReference::RepositoryOnly {
                    spec: repository,
                    ..
                } => {
                    tracing::debug!(target: "resolver", "Repository import {repository}");
                    self.accumulator.add_repository_import(repository.clone());
                    continue;
                }
                ImportReference::Remote(workflow_spec) => {
                    let full_path = paths
                        .resolve_remote(&spec.path, workflow_spec, &site, ctx)
                        .await
                        .map_err(|e| import_error(e, &spec.path, &site))?;
                    let import_path = if parent.remote_origin.is_some() {
                        workflow_spec.to_string()
                    } else {
                        spec.path.clone()
                    };
                    let node = workflow_spec.to_string();
                    (import_path, full_path, node, Some(workflow_spec.origin()))
                }
                ImportReference::Local {
                    path,
                    ..
                } => {
                    ctx.checkpoint()?;
                    let full_path = paths
                        .resolve_local(&spec.path, path, parent.base_dir, &site)
                        .map_err(|e| import_error(e, &spec.path, &site))?;
                    let node = self.display_path(&full_path);
                    (spec.path.clone(), full_path, node, None)
                }
            };

            self.graph.add_import(parent.display, &node);
            if !self.visited.insert(node.clone()) {
                tracing::debug!(target: "resolver", "Skipping already visited {node}");
                continue;
            }

            let base_dir = full_path.parent().map(Path::to_path_buf).unwrap_or_default();
            self.queue.push_back(ImportQueueItem {
                import_path,
                full_path,
                display: node,
                section: reference.section().map(str::to_string),
                base_dir,
                inputs: spec.inputs,
                remote_origin,
                site,
            });
        }
        Ok(())
    }

    async fn process(
        &mut self,
        paths: &mut PathResolver,
        item: ImportQueueItem,
        ctx: &OperationContext,
    ) -> Result<(), AwfError> {
        tracing::debug!(target: "resolver", "Processing {}", item.display);
        self.processed.push(item.display.clone());

        ctx.checkpoint()?;
        let content = read_text(&item.full_path)?;

        match classify(&item) {
            ImportKind::YamlWorkflow => {
                let map =
                    FrontmatterParser::parse_yaml(&content, &content, 1, Path::new(&item.display))?;
                self.accumulator.merge_inputs(&item.inputs);
                self.accumulator.merge_yaml_workflow(
                    map.get("jobs").map(canonical_json),
                    map.get("services").map(canonical_json),
                );
                Ok(())
            }
            ImportKind::Agent => {
                let parsed = FrontmatterParser::parse(&content, Path::new(&item.display))?;
                let frontmatter = parsed.frontmatter.unwrap_or_default();
                let inputs = effective_inputs(&frontmatter, &item)?;
                self.accumulator.merge_inputs(&inputs);

                let agent_source = match &item.remote_origin {
                    Some(_) => {
                        let spec = item.display.rsplit_once('@').map_or(&*item.display, |(p, _)| p);
                        format!("/{spec}")
                    }
                    None => item.full_path.to_string_lossy().replace('\\', "/"),
                };
                self.accumulator
                    .set_agent(agent_relative_path(&agent_source), item.import_path.clone())?;
                self.accumulator.merge_fields(FieldExtractor::extract(&frontmatter, &agent_source));

                if inputs.is_empty() {
                    self.accumulator.add_runtime_import(item.display.clone());
                } else {
                    let body = self.section_body(&parsed.body, &item)?;
                    self.accumulator.append_markdown(&substitute_inputs(&body, &inputs));
                }
                Ok(())
            }
            ImportKind::Markdown => {
                let parsed = FrontmatterParser::parse(&content, Path::new(&item.display))?;
                let frontmatter = parsed.frontmatter.clone().unwrap_or_default();

                self.validate_included(
                    &frontmatter,
                    &item,
                    parsed.raw_frontmatter.as_deref(),
                    parsed.frontmatter_line_offset,
                );

                let inputs = effective_inputs(&frontmatter, &item)?;
                self.accumulator.merge_inputs(&inputs);
                self.accumulator.merge_fields(FieldExtractor::extract(&frontmatter, &item.display));

                if inputs.is_empty() && item.section.is_none() {
                    self.accumulator.add_runtime_import(item.display.clone());
                } else {
                    let body = self.section_body(&parsed.body, &item)?;
                    self.accumulator.append_markdown(&substitute_inputs(&body, &inputs));
                }

                let Some(imports) = frontmatter.get("imports") else {
                    return Ok(());
                };
                let specs = ImportSpec::parse_list(imports, &item.display)?;
                let parent = Parent {
                    display: &item.display,
                    base_dir: &item.base_dir,
                    remote_origin: item.remote_origin.as_ref(),
                    raw_frontmatter: parsed.raw_frontmatter.as_deref().unwrap_or_default(),
                    line_offset: parsed.frontmatter_line_offset,
                };
                self.enqueue(paths, &parent, specs, ctx).await
            }
        }
    }

    /// Body restricted to the item's section, if it has one.
    fn section_body(&self, body: &str, item: &ImportQueueItem) -> Result<String, AwfError> {
        let Some(section) = &item.section else {
            return Ok(body.to_string());
        };
        extract_section(body, section).ok_or_else(|| AwfError::Import {
            import_path: item.import_path.clone(),
            file: item.site.file.clone(),
            line: item.site.line,
            column: item.site.column,
            cause: format!("section '{section}' not found in {}", item.display),
        })
    }

    /// Check an imported file against the included-file schema. Violations
    /// are reported but never fatal.
    fn validate_included(
        &self,
        frontmatter: &Frontmatter,
        item: &ImportQueueItem,
        raw_frontmatter: Option<&str>,
        line_offset: usize,
    ) {
        let validator = match SchemaValidator::included_file() {
            Ok(validator) => validator,
            Err(e) => {
                tracing::warn!("Included-file schema unavailable: {e}");
                return;
            }
        };
        if let Err(e) = validator.validate(frontmatter, &item.display, raw_frontmatter, line_offset)
        {
            tracing::warn!("Ignoring schema problem in imported file: {e}");
        }
    }

    /// Path relative to the root workflow directory, `/`-separated.
    fn display_path(&self, full_path: &Path) -> String {
        relative_path(&self.root_dir, full_path).to_string_lossy().replace('\\', "/")
    }
}

fn classify(item: &ImportQueueItem) -> ImportKind {
    let name = item.display.to_lowercase();
    let name = name.split('@').next().unwrap_or(&name);
    if name.ends_with(".yml") || name.ends_with(".yaml") {
        ImportKind::YamlWorkflow
    } else if is_custom_agent_path(&item.full_path.to_string_lossy())
        || (item.remote_origin.is_some() && is_custom_agent_path(name))
    {
        ImportKind::Agent
    } else {
        ImportKind::Markdown
    }
}

/// `path` expressed relative to `base`, climbing with `..` where needed.
///
/// Both paths are expected to be canonical. Paths on different roots (e.g.
/// Windows drives) are returned unchanged.
fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base_components: Vec<_> = base.components().collect();
    let path_components: Vec<_> = path.components().collect();
    let common = base_components
        .iter()
        .zip(&path_components)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return path.to_path_buf();
    }
    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Path of an agent file starting at `.github/`.
fn agent_relative_path(path: &str) -> String {
    path.find(".github/").map_or_else(|| path.to_string(), |i| path[i..].to_string())
}

/// Caller inputs completed with declared defaults.
///
/// # Errors
///
/// [`AwfError::MissingImportInput`] when a declared `required` input is
/// neither supplied nor defaulted.
fn effective_inputs(
    frontmatter: &Frontmatter,
    item: &ImportQueueItem,
) -> Result<Map<String, Value>, AwfError> {
    let mut inputs = item.inputs.clone();
    let Some(Value::Object(declared)) = frontmatter.get("inputs") else {
        return Ok(inputs);
    };
    for (name, declaration) in declared {
        if inputs.contains_key(name) {
            continue;
        }
        let Value::Object(declaration) = declaration else {
            continue;
        };
        if let Some(default) = declaration.get("default") {
            inputs.insert(name.clone(), default.clone());
        } else if declaration.get("required").and_then(Value::as_bool) == Some(true) {
            return Err(AwfError::MissingImportInput {
                import_path: item.import_path.clone(),
                input: name.clone(),
            });
        }
    }
    Ok(inputs)
}

/// Wrap a resolution failure with the location of the reference.
fn import_error(error: AwfError, import_path: &str, site: &ImportSite) -> AwfError {
    match error {
        AwfError::Cancelled
        | AwfError::LockFileImport {
            ..
        } => error,
        other => AwfError::Import {
            import_path: import_path.to_string(),
            file: site.file.clone(),
            line: site.line,
            column: site.column,
            cause: other.to_string(),
        },
    }
}

/// JSON with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical_json(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRemoteFetcher, write_file};
    use serde_json::json;
    use tempfile::TempDir;

    async fn resolve_with(
        root: &Path,
        fetcher: MockRemoteFetcher,
    ) -> Result<ImportsResult, AwfError> {
        let mut resolver = ImportResolver::new(Arc::new(fetcher));
        resolver.resolve_file(root, &OperationContext::new()).await
    }

    async fn resolve(root: &Path) -> Result<ImportsResult, AwfError> {
        resolve_with(root, MockRemoteFetcher::new()).await
    }

    #[tokio::test]
    async fn test_diamond_imports_are_topologically_ordered() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_file(dir, "A.md", "---\nimports: [B.md, C.md]\n---\n# A\n");
        write_file(dir, "B.md", "---\nimports: [D.md]\n---\n# B\n");
        write_file(dir, "C.md", "---\nimports: [D.md]\n---\n# C\n");
        write_file(dir, "D.md", "# D\n");

        let result = resolve(&dir.join("A.md")).await.unwrap();
        assert_eq!(result.imported_files, vec!["D.md", "B.md", "C.md", "A.md"]);
        // D was visited once even though two files import it
        assert_eq!(result.import_paths, vec!["B.md", "C.md", "D.md"]);
    }

    #[tokio::test]
    async fn test_cycle_back_to_root() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [B.md]\n---\n");
        write_file(temp.path(), "B.md", "---\nimports: [A.md]\n---\n");

        match resolve(&temp.path().join("A.md")).await.unwrap_err() {
            AwfError::CircularImport {
                chain,
                workflow_file,
            } => {
                assert_eq!(chain, vec!["A.md", "B.md", "A.md"]);
                assert!(workflow_file.ends_with("A.md"));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_self_import_cycle() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [B.md]\n---\n");
        write_file(temp.path(), "B.md", "---\nimports: [B.md]\n---\n");

        let err = resolve(&temp.path().join("A.md")).await.unwrap_err();
        assert!(matches!(err, AwfError::CircularImport { chain, .. } if chain == ["B.md", "B.md"]));
    }

    #[tokio::test]
    async fn test_nested_remote_import_is_anchored_at_parent() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [owner/repo/dir/F.md@v1]\n---\n");
        let fetcher = MockRemoteFetcher::new()
            .with_file("owner", "repo", "v1", "dir/F.md", "---\nimports: [G.md]\n---\n# F\n")
            .with_file("owner", "repo", "v1", "dir/G.md", "---\ntools:\n  bash: true\n---\n# G\n");

        let result = resolve_with(&temp.path().join("A.md"), fetcher).await.unwrap();
        assert_eq!(
            result.imported_files,
            vec!["owner/repo/dir/G.md@v1", "owner/repo/dir/F.md@v1", "A.md"]
        );
        assert_eq!(result.merged_tools, vec![json!({"bash": true})]);
    }

    #[tokio::test]
    async fn test_nested_remote_escape_rejected() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [owner/repo/dir/F.md@v1]\n---\n");
        let fetcher = MockRemoteFetcher::new().with_file(
            "owner",
            "repo",
            "v1",
            "dir/F.md",
            "---\nimports: [../secret.md]\n---\n",
        );

        let err = resolve_with(&temp.path().join("A.md"), fetcher).await.unwrap_err();
        match err {
            AwfError::Import {
                import_path,
                file,
                line,
                cause,
                ..
            } => {
                assert_eq!(import_path, "../secret.md");
                assert_eq!(file, "owner/repo/dir/F.md@v1");
                assert_eq!(line, 2);
                assert!(cause.contains("escapes"), "{cause}");
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_top_level_remote_escape_rejected() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports:\n  - owner/repo/../../../../x.md@v1\n---\n");
        let fetcher = MockRemoteFetcher::new().with_file(
            "owner",
            "repo",
            "v1",
            "../../../../x.md",
            "---\n---\nleaked\n",
        );

        let err = resolve_with(&temp.path().join("A.md"), fetcher).await.unwrap_err();
        match err {
            AwfError::Import {
                import_path,
                line,
                cause,
                ..
            } => {
                assert_eq!(import_path, "owner/repo/../../../../x.md@v1");
                assert_eq!(line, 3);
                assert!(cause.contains("escapes the base path 'owner/repo'"), "{cause}");
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_import_reports_location() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\non: push\nimports:\n  - shared/missing.md\n---\n");

        match resolve(&temp.path().join("A.md")).await.unwrap_err() {
            AwfError::Import {
                import_path,
                file,
                line,
                column,
                cause,
            } => {
                assert_eq!(import_path, "shared/missing.md");
                assert_eq!(file, "A.md");
                assert_eq!((line, column), (4, 5));
                assert!(cause.contains("not found"));
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lock_file_import_rejected() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [ci.lock.yml]\n---\n");
        write_file(temp.path(), "ci.lock.yml", "jobs: {}\n");

        let err = resolve(&temp.path().join("A.md")).await.unwrap_err();
        assert!(matches!(err, AwfError::LockFileImport { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_yaml_workflow_contributes_jobs_and_services() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [shared/ci.yml]\n---\n");
        write_file(
            temp.path(),
            "shared/ci.yml",
            "jobs:\n  test:\n    runs-on: ubuntu-latest\n    steps: []\nservices:\n  redis:\n    image: redis\n",
        );

        let result = resolve(&temp.path().join("A.md")).await.unwrap();
        assert_eq!(
            result.merged_jobs,
            vec![json!({"test": {"runs-on": "ubuntu-latest", "steps": []}})]
        );
        assert_eq!(result.merged_services, vec![json!({"redis": {"image": "redis"}})]);
        assert!(result.import_paths.is_empty());
        assert_eq!(result.imported_files, vec!["shared/ci.yml", "A.md"]);
    }

    #[tokio::test]
    async fn test_section_and_inputs_are_inlined() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "A.md",
            "---\nimports:\n  - shared/guide.md#Review\n  - path: shared/lang.md\n    inputs:\n      language: rust\n---\n",
        );
        write_file(temp.path(), "shared/guide.md", "# Guide\nintro\n## Review\nbe kind\n## Other\nx\n");
        write_file(
            temp.path(),
            "shared/lang.md",
            "---\ninputs:\n  language:\n    required: true\n  depth:\n    default: 2\n---\nUse ${{ github.aw.inputs.language }} at depth ${{ github.aw.inputs.depth }}.\n",
        );

        let result = resolve(&temp.path().join("A.md")).await.unwrap();
        assert_eq!(result.merged_markdown, "## Review\nbe kind\n\nUse rust at depth 2.");
        assert_eq!(result.import_inputs, *json!({"language": "rust", "depth": 2}).as_object().unwrap());
        assert!(result.import_paths.is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_input() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [shared/lang.md]\n---\n");
        write_file(temp.path(), "shared/lang.md", "---\ninputs:\n  language:\n    required: true\n---\n");

        let err = resolve(&temp.path().join("A.md")).await.unwrap_err();
        assert!(matches!(err, AwfError::MissingImportInput { input, .. } if input == "language"));
    }

    #[tokio::test]
    async fn test_agents_single_valued() {
        let temp = TempDir::new().unwrap();
        let workflows = temp.path().join(".github/workflows");
        write_file(temp.path(), ".github/agents/reviewer.md", "---\nname: reviewer\ntools: [read]\n---\nReview.\n");
        write_file(temp.path(), ".github/agents/writer.md", "---\nname: writer\n---\nWrite.\n");
        write_file(&workflows, "one.md", "---\nimports: [../agents/reviewer.md]\n---\n");
        write_file(
            &workflows,
            "two.md",
            "---\nimports: [../agents/reviewer.md, ../agents/writer.md]\n---\n",
        );

        let result = resolve(&workflows.join("one.md")).await.unwrap();
        assert_eq!(result.agent_file.as_deref(), Some(".github/agents/reviewer.md"));
        assert_eq!(result.agent_import_spec.as_deref(), Some("../agents/reviewer.md"));
        assert_eq!(result.merged_tools, vec![json!({})]);
        assert_eq!(result.import_paths, vec!["../agents/reviewer.md"]);
        assert_eq!(result.imported_files, vec!["../agents/reviewer.md", "one.md"]);

        let err = resolve(&workflows.join("two.md")).await.unwrap_err();
        assert!(matches!(err, AwfError::ConflictingAgent { .. }));
    }

    #[tokio::test]
    async fn test_repository_imports_recorded() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "A.md",
            "---\nimports: [octo/agents@v2, acme/tools, octo/agents@v2]\n---\n",
        );

        let result = resolve(&temp.path().join("A.md")).await.unwrap();
        assert_eq!(
            result.repository_imports,
            vec!["octo/agents@v2", "acme/tools", "octo/agents@v2"]
        );
        assert_eq!(result.imported_files, vec!["A.md"]);
    }

    #[tokio::test]
    async fn test_invalid_import_entry() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [42]\n---\n");
        let err = resolve(&temp.path().join("A.md")).await.unwrap_err();
        assert!(matches!(err, AwfError::InvalidImport { .. }));
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [z.md, m.md, a.md]\n---\n");
        for (name, label) in [("z.md", "z"), ("m.md", "m"), ("a.md", "a")] {
            write_file(temp.path(), name, &format!("---\nlabels: [{label}, shared]\n---\n"));
        }

        let first = serde_json::to_string(&resolve(&temp.path().join("A.md")).await.unwrap()).unwrap();
        let second = serde_json::to_string(&resolve(&temp.path().join("A.md")).await.unwrap()).unwrap();
        assert_eq!(first, second);

        let result = resolve(&temp.path().join("A.md")).await.unwrap();
        assert_eq!(result.merged_labels, vec!["z", "shared", "m", "a"]);
        assert_eq!(result.imported_files, vec!["a.md", "m.md", "z.md", "A.md"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "A.md", "---\nimports: [B.md]\n---\n");
        write_file(temp.path(), "B.md", "# B\n");

        let ctx = OperationContext::new();
        ctx.cancel();
        let mut resolver = ImportResolver::new(Arc::new(MockRemoteFetcher::new()));
        let err = resolver.resolve_file(&temp.path().join("A.md"), &ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b/c/d.md")), Path::new("c/d.md"));
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/x/d.md")), Path::new("../x/d.md"));
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
        let canonical = canonical_json(&value);
        assert_eq!(
            serde_json::to_string(&canonical).unwrap(),
            r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#
        );
    }
}
