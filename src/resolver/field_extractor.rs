//! Harvesting of merge-relevant fields from imported frontmatter.
//!
//! Structured fields (tools, steps, permissions, ...) are carried as JSON
//! fragments and merged semantically by the compiler later. List fields
//! (bots, labels, ...) are typed so the accumulator can de-duplicate them.
//! A malformed field is logged and skipped; the rest of the file still
//! contributes.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::markdown::frontmatter::{Frontmatter, json_type_name};
use crate::markdown::is_custom_agent_path;

/// A plugin reference, either `id` or `{id, mcp}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSpec {
    /// Plugin identifier
    pub id: String,
    /// Optional MCP configuration attached to the plugin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp: Option<Value>,
}

/// Fields harvested from one imported file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    /// `tools` (empty mapping for custom agent files)
    pub tools: Option<Value>,
    /// `engine`
    pub engine: Option<Value>,
    /// `mcp-servers`
    pub mcp_servers: Option<Value>,
    /// `safe-outputs`
    pub safe_outputs: Option<Value>,
    /// `safe-inputs`
    pub safe_inputs: Option<Value>,
    /// `steps`
    pub steps: Option<Value>,
    /// `runtimes`
    pub runtimes: Option<Value>,
    /// `services`
    pub services: Option<Value>,
    /// `network`
    pub network: Option<Value>,
    /// `permissions`
    pub permissions: Option<Value>,
    /// `secret-masking`
    pub secret_masking: Option<Value>,
    /// `post-steps`
    pub post_steps: Option<Value>,
    /// `cache`
    pub cache: Option<Value>,
    /// `features`
    pub features: Option<Value>,
    /// `bots` (top level and under `on`)
    pub bots: Vec<String>,
    /// `plugins`
    pub plugins: Vec<PluginSpec>,
    /// `skip-roles` (top level and under `on`)
    pub skip_roles: Vec<String>,
    /// `skip-bots` (top level and under `on`)
    pub skip_bots: Vec<String>,
    /// `labels`
    pub labels: Vec<String>,
}

/// Extracts [`ExtractedFields`] from parsed frontmatter.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Harvest every merge-relevant field of `frontmatter`.
    ///
    /// `source` is the path of the file the frontmatter came from. It is used
    /// for custom-agent detection and in warnings.
    pub fn extract(frontmatter: &Frontmatter, source: &str) -> ExtractedFields {
        let tools = if is_custom_agent_path(source) {
            // Agent files list tool names; that shape is not a tools mapping
            Some(Value::Object(Map::new()))
        } else {
            object_field(frontmatter, "tools", source)
        };

        let on = frontmatter.get("on").and_then(Value::as_object);

        let mut bots = string_list(frontmatter.get("bots"), "bots", source);
        let mut skip_roles = string_list(frontmatter.get("skip-roles"), "skip-roles", source);
        let mut skip_bots = string_list(frontmatter.get("skip-bots"), "skip-bots", source);
        if let Some(on) = on {
            bots.extend(string_list(on.get("bots"), "on.bots", source));
            skip_roles.extend(string_list(on.get("skip-roles"), "on.skip-roles", source));
            skip_bots.extend(string_list(on.get("skip-bots"), "on.skip-bots", source));
        }

        ExtractedFields {
            tools,
            engine: engine_field(frontmatter, source),
            mcp_servers: object_field(frontmatter, "mcp-servers", source),
            safe_outputs: object_field(frontmatter, "safe-outputs", source),
            safe_inputs: object_field(frontmatter, "safe-inputs", source),
            steps: list_field(frontmatter, "steps", source),
            runtimes: object_field(frontmatter, "runtimes", source),
            services: object_field(frontmatter, "services", source),
            network: any_field(frontmatter, "network"),
            permissions: any_field(frontmatter, "permissions"),
            secret_masking: object_field(frontmatter, "secret-masking", source),
            post_steps: list_field(frontmatter, "post-steps", source),
            cache: any_field(frontmatter, "cache"),
            features: object_field(frontmatter, "features", source),
            bots,
            plugins: plugins(frontmatter.get("plugins"), source),
            skip_roles,
            skip_bots,
            labels: string_list(frontmatter.get("labels"), "labels", source),
        }
    }
}

fn skip(field: &str, source: &str, expected: &str, found: &Value) {
    tracing::warn!(
        "Ignoring '{field}' in {source}: expected {expected}, found {}",
        json_type_name(found)
    );
}

fn any_field(frontmatter: &Frontmatter, key: &str) -> Option<Value> {
    frontmatter.get(key).filter(|v| !v.is_null()).cloned()
}

fn object_field(frontmatter: &Frontmatter, key: &str, source: &str) -> Option<Value> {
    match frontmatter.get(key)? {
        Value::Null => None,
        value @ Value::Object(_) => Some(value.clone()),
        other => {
            skip(key, source, "a mapping", other);
            None
        }
    }
}

fn list_field(frontmatter: &Frontmatter, key: &str, source: &str) -> Option<Value> {
    match frontmatter.get(key)? {
        Value::Null => None,
        value @ Value::Array(_) => Some(value.clone()),
        other => {
            skip(key, source, "a list", other);
            None
        }
    }
}

fn engine_field(frontmatter: &Frontmatter, source: &str) -> Option<Value> {
    match frontmatter.get("engine")? {
        Value::Null => None,
        value @ (Value::String(_) | Value::Object(_)) => Some(value.clone()),
        other => {
            skip("engine", source, "a string or a mapping", other);
            None
        }
    }
}

/// A string or a list of strings. Non-string items are skipped.
fn string_list(value: Option<&Value>, field: &str, source: &str) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    skip(field, source, "string items", other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            skip(field, source, "a string or a list", other);
            Vec::new()
        }
    }
}

fn plugins(value: Option<&Value>, source: &str) -> Vec<PluginSpec> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            skip("plugins", source, "a list", other);
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(PluginSpec {
                id: id.clone(),
                mcp: None,
            }),
            Value::Object(map) => match map.get("id") {
                Some(Value::String(id)) => Some(PluginSpec {
                    id: id.clone(),
                    mcp: map.get("mcp").filter(|v| !v.is_null()).cloned(),
                }),
                _ => {
                    tracing::warn!("Ignoring plugin without string 'id' in {source}");
                    None
                }
            },
            other => {
                skip("plugins", source, "string or mapping items", other);
                None
            }
        })
        .collect()
}
