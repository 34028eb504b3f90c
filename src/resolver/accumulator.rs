//! Deterministic merge of harvested fields across one traversal.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::core::AwfError;
use crate::resolver::field_extractor::{ExtractedFields, PluginSpec};

/// The merged product of resolving a workflow's imports.
///
/// Ordered bags keep visit order, set-valued bags keep first-insertion
/// order. Serializing the same result twice yields identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImportsResult {
    /// `tools` fragments in visit order
    pub merged_tools: Vec<Value>,
    /// `mcp-servers` fragments
    pub merged_mcp_servers: Vec<Value>,
    /// `engine` values for the consumer to reconcile
    pub merged_engines: Vec<Value>,
    /// `safe-outputs` fragments
    pub merged_safe_outputs: Vec<Value>,
    /// `safe-inputs` fragments
    pub merged_safe_inputs: Vec<Value>,
    /// `steps` fragments
    pub merged_steps: Vec<Value>,
    /// `runtimes` fragments
    pub merged_runtimes: Vec<Value>,
    /// `services` fragments (markdown and YAML imports)
    pub merged_services: Vec<Value>,
    /// `jobs` fragments from YAML imports
    pub merged_jobs: Vec<Value>,
    /// `network` fragments
    pub merged_network: Vec<Value>,
    /// `permissions` fragments
    pub merged_permissions: Vec<Value>,
    /// `secret-masking` fragments
    pub merged_secret_masking: Vec<Value>,
    /// `post-steps` fragments
    pub merged_post_steps: Vec<Value>,
    /// `cache` fragments
    pub merged_caches: Vec<Value>,
    /// `features` fragments
    pub merged_features: Vec<Value>,
    /// Union of `bots`
    pub merged_bots: Vec<String>,
    /// Plugins, de-duplicated by id
    pub merged_plugins: Vec<PluginSpec>,
    /// Union of `skip-roles`
    pub merged_skip_roles: Vec<String>,
    /// Union of `skip-bots`
    pub merged_skip_bots: Vec<String>,
    /// Union of `labels`
    pub merged_labels: Vec<String>,
    /// Inlined markdown bodies separated by blank lines
    pub merged_markdown: String,
    /// Imports left for runtime inclusion
    pub import_paths: Vec<String>,
    /// Custom agent file relative from `.github/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_file: Option<String>,
    /// Import reference that brought in the agent file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_import_spec: Option<String>,
    /// Repository-only imports as written
    pub repository_imports: Vec<String>,
    /// All import inputs, last write wins per key
    pub import_inputs: Map<String, Value>,
    /// Imported files in topological order, root last
    pub imported_files: Vec<String>,
}

/// Order-preserving set of strings.
#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn extend(&mut self, values: impl IntoIterator<Item = String>) {
        for value in values {
            if self.seen.insert(value.clone()) {
                self.items.push(value);
            }
        }
    }
}

/// Per-traversal accumulator.
#[derive(Debug, Default)]
pub struct ImportAccumulator {
    result: ImportsResult,
    bots: OrderedSet,
    skip_roles: OrderedSet,
    skip_bots: OrderedSet,
    labels: OrderedSet,
    plugin_ids: HashSet<String>,
    repositories: Vec<String>,
}

impl ImportAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's extracted fields.
    pub fn merge_fields(&mut self, fields: ExtractedFields) {
        let r = &mut self.result;
        push(&mut r.merged_tools, fields.tools);
        push(&mut r.merged_engines, fields.engine);
        push(&mut r.merged_mcp_servers, fields.mcp_servers);
        push(&mut r.merged_safe_outputs, fields.safe_outputs);
        push(&mut r.merged_safe_inputs, fields.safe_inputs);
        push(&mut r.merged_steps, fields.steps);
        push(&mut r.merged_runtimes, fields.runtimes);
        push(&mut r.merged_services, fields.services);
        push(&mut r.merged_network, fields.network);
        push(&mut r.merged_permissions, fields.permissions);
        push(&mut r.merged_secret_masking, fields.secret_masking);
        push(&mut r.merged_post_steps, fields.post_steps);
        push(&mut r.merged_caches, fields.cache);
        push(&mut r.merged_features, fields.features);

        self.bots.extend(fields.bots);
        self.skip_roles.extend(fields.skip_roles);
        self.skip_bots.extend(fields.skip_bots);
        self.labels.extend(fields.labels);
        for plugin in fields.plugins {
            if self.plugin_ids.insert(plugin.id.clone()) {
                self.result.merged_plugins.push(plugin);
            }
        }
    }

    /// Fold `jobs` and `services` harvested from a YAML workflow import.
    pub fn merge_yaml_workflow(&mut self, jobs: Option<Value>, services: Option<Value>) {
        push(&mut self.result.merged_jobs, jobs);
        push(&mut self.result.merged_services, services);
    }

    /// Fold import inputs (last write wins by key).
    pub fn merge_inputs(&mut self, inputs: &Map<String, Value>) {
        for (key, value) in inputs {
            self.result.import_inputs.insert(key.clone(), value.clone());
        }
    }

    /// Append an inlined body.
    pub fn append_markdown(&mut self, body: &str) {
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        if !self.result.merged_markdown.is_empty() {
            self.result.merged_markdown.push_str("\n\n");
        }
        self.result.merged_markdown.push_str(body);
    }

    /// Record an import resolved at runtime instead of inlined.
    pub fn add_runtime_import(&mut self, path: impl Into<String>) {
        self.result.import_paths.push(path.into());
    }

    /// Record a repository-only import as written, duplicates included.
    pub fn add_repository_import(&mut self, spec: impl Into<String>) {
        self.repositories.push(spec.into());
    }

    /// Record the custom agent file.
    ///
    /// # Errors
    ///
    /// [`AwfError::ConflictingAgent`] when an agent was already recorded.
    pub fn set_agent(&mut self, agent_file: String, import_spec: String) -> Result<(), AwfError> {
        if let Some(first) = &self.result.agent_file {
            return Err(AwfError::ConflictingAgent {
                first: first.clone(),
                second: agent_file,
            });
        }
        self.result.agent_file = Some(agent_file);
        self.result.agent_import_spec = Some(import_spec);
        Ok(())
    }

    /// Produce the final result with the topological file order.
    pub fn finish(self, imported_files: Vec<String>) -> ImportsResult {
        let mut result = self.result;
        result.merged_bots = self.bots.items;
        result.merged_skip_roles = self.skip_roles.items;
        result.merged_skip_bots = self.skip_bots.items;
        result.merged_labels = self.labels.items;
        result.repository_imports = self.repositories;
        result.imported_files = imported_files;
        result
    }
}

fn push(bag: &mut Vec<Value>, value: Option<Value>) {
    if let Some(value) = value {
        bag.push(value);
    }
}
