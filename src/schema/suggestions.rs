//! Suggestion heuristics for schema violations.
//!
//! The helpers here navigate a JSON schema by instance path (following
//! `$ref`, `oneOf`, `anyOf` and `allOf`) to find which properties are valid
//! where, and use Levenshtein distance to turn typos into "did you mean"
//! hints.

use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use strsim::levenshtein;

/// Maximum `$ref`/combinator nesting followed while expanding a schema.
const MAX_EXPANSION_DEPTH: usize = 16;

/// Maximum property depth searched when looking for a misplaced field.
const MAX_SEARCH_DEPTH: usize = 6;

/// Maximum edit distance for `candidate` to count as a close match.
///
/// A match is close when the distance is at most 2 or at most a third of
/// the candidate's length (but never less than 1).
pub fn max_distance(candidate: &str) -> usize {
    2.max((candidate.chars().count() / 3).max(1))
}

/// Close matches for `target` among `available`, closest first.
pub fn close_matches<'a, I>(target: &str, available: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let limit = max_distance(target);
    let mut scored: Vec<(usize, &String)> = available
        .into_iter()
        .map(|name| (levenshtein(target, name), name))
        .filter(|(distance, _)| *distance <= limit)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, name)| name.clone()).collect()
}

/// Split a JSON pointer into unescaped segments.
pub fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Render a JSON pointer for messages (`the top level` for the root).
pub fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() || pointer == "/" {
        "the top level".to_string()
    } else {
        pointer.to_string()
    }
}

/// Expand `schema` into the concrete subschemas it stands for.
fn expand<'a>(root: &'a Value, schema: &'a Value, out: &mut Vec<&'a Value>, depth: usize) {
    if depth > MAX_EXPANSION_DEPTH {
        return;
    }
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str)
        && let Some(pointer) = reference.strip_prefix('#')
        && let Some(target) = root.pointer(pointer)
    {
        expand(root, target, out, depth + 1);
    }
    out.push(schema);
    for key in ["oneOf", "anyOf", "allOf"] {
        if let Some(Value::Array(options)) = schema.get(key) {
            for option in options {
                expand(root, option, out, depth + 1);
            }
        }
    }
}

/// Subschemas describing the instance at `segments`.
pub fn schemas_at<'a>(root: &'a Value, segments: &[String]) -> Vec<&'a Value> {
    let mut current = Vec::new();
    expand(root, root, &mut current, 0);

    for segment in segments {
        let mut next = Vec::new();
        for schema in &current {
            if let Some(child) = schema.get("properties").and_then(|p| p.get(segment)) {
                expand(root, child, &mut next, 0);
            } else if segment.parse::<usize>().is_ok()
                && let Some(items) = schema.get("items").filter(|i| i.is_object())
            {
                expand(root, items, &mut next, 0);
            } else if let Some(additional) =
                schema.get("additionalProperties").filter(|a| a.is_object())
            {
                expand(root, additional, &mut next, 0);
            }
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

/// Property names valid at `segments`, sorted.
pub fn properties_at(root: &Value, segments: &[String]) -> Vec<String> {
    let names: BTreeSet<String> = schemas_at(root, segments)
        .into_iter()
        .filter_map(|schema| schema.get("properties").and_then(Value::as_object))
        .flat_map(|props| props.keys().cloned())
        .collect();
    names.into_iter().collect()
}

/// Where a property name is valid elsewhere in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementHint {
    /// JSON pointer of the object the property belongs to
    pub path: String,
    /// The valid property name (may differ from the typo)
    pub property: String,
}

/// Find the shallowest object path (other than `exclude`) where `name` or a
/// close match of it is a valid property.
pub fn find_placement(root: &Value, name: &str, exclude: &str) -> Option<PlacementHint> {
    let limit = max_distance(name);
    let mut best: Option<(usize, usize, PlacementHint)> = None;
    let mut seen: HashSet<(String, *const Value)> = HashSet::new();
    let mut frontier: Vec<(String, &Value)> = vec![(String::new(), root)];

    for depth in 0..=MAX_SEARCH_DEPTH {
        let mut next_frontier = Vec::new();
        for (path, schema) in frontier {
            let mut expanded = Vec::new();
            expand(root, schema, &mut expanded, 0);
            for candidate in expanded {
                if !seen.insert((path.clone(), candidate as *const Value)) {
                    continue;
                }
                let Some(props) = candidate.get("properties").and_then(Value::as_object) else {
                    continue;
                };
                for (prop, child) in props {
                    if path != exclude {
                        let distance = levenshtein(name, prop);
                        if distance <= limit {
                            let hint = PlacementHint {
                                path: if path.is_empty() {
                                    "/".to_string()
                                } else {
                                    path.clone()
                                },
                                property: prop.clone(),
                            };
                            let better = match &best {
                                None => true,
                                Some((d, dist, current)) => {
                                    (depth, distance, &hint.path) < (*d, *dist, &current.path)
                                }
                            };
                            if better {
                                best = Some((depth, distance, hint));
                            }
                        }
                    }
                    next_frontier.push((format!("{path}/{prop}"), child));
                }
            }
        }
        if best.is_some() {
            break;
        }
        frontier = next_frontier;
    }
    best.map(|(_, _, hint)| hint)
}

/// Suggestions for an unknown property `name` found on the object at
/// `pointer`.
pub fn unknown_property_suggestions(root: &Value, pointer: &str, name: &str) -> Vec<String> {
    let segments = pointer_segments(pointer);
    let valid = properties_at(root, &segments);
    let mut suggestions = Vec::new();

    let close = close_matches(name, &valid);
    match close.as_slice() {
        [] if !valid.is_empty() => suggestions.push(format!(
            "Valid properties at {}: {}",
            display_pointer(pointer),
            valid.join(", ")
        )),
        [] => {}
        [only] => suggestions.push(format!("Did you mean '{only}'?")),
        many => suggestions.push(format!("Did you mean one of: {}?", many.join(", "))),
    }

    if let Some(hint) = find_placement(root, name, pointer) {
        if hint.property == name {
            suggestions.push(format!("'{name}' belongs under {}", hint.path));
        } else {
            suggestions.push(format!(
                "Did you mean '{}'? '{}' belongs under {}",
                hint.property, hint.property, hint.path
            ));
        }
    }
    suggestions
}

/// Suggestions for a value outside an enumeration.
pub fn enum_suggestions(value: &Value, allowed: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();
    if let Value::String(text) = value
        && let Some(best) = close_matches(text, allowed).first()
    {
        suggestions.push(format!("Did you mean '{best}'?"));
    }
    if !allowed.is_empty() {
        suggestions.push(format!("Allowed values: {}", allowed.join(", ")));
    }
    suggestions
}

/// Expected type(s) declared by the schemas at `segments`.
pub fn expected_type(root: &Value, segments: &[String]) -> String {
    let mut types: BTreeSet<String> = BTreeSet::new();
    for schema in schemas_at(root, segments) {
        match schema.get("type") {
            Some(Value::String(t)) => {
                types.insert(t.clone());
            }
            Some(Value::Array(list)) => {
                types.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    if types.is_empty() {
        "a different type".to_string()
    } else {
        types.into_iter().collect::<Vec<_>>().join(" or ")
    }
}

/// Example literal for the value at `segments`.
///
/// Uses the schema's `examples` or `default` when present, otherwise a
/// placeholder for the first declared type.
pub fn type_example(root: &Value, segments: &[String]) -> Option<String> {
    let schemas = schemas_at(root, segments);
    for schema in &schemas {
        if let Some(Value::Array(examples)) = schema.get("examples")
            && let Some(first) = examples.first()
        {
            return Some(first.to_string());
        }
        if let Some(default) = schema.get("default") {
            return Some(default.to_string());
        }
    }
    let first_type = schemas.iter().find_map(|schema| match schema.get("type") {
        Some(Value::String(t)) => Some(t.clone()),
        Some(Value::Array(list)) => list.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    })?;
    let placeholder = match first_type.as_str() {
        "string" => "\"value\"",
        "integer" => "1",
        "number" => "1.5",
        "boolean" => "true",
        "array" => "[]",
        "object" => "{}",
        "null" => "null",
        _ => return None,
    };
    Some(placeholder.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "on": {
                    "type": "object",
                    "properties": {
                        "skip-if-match": {"type": "string"},
                        "schedule": {"type": "string"}
                    }
                },
                "actions": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "pin": {"type": "boolean"},
                        "update": {"type": "boolean"}
                    }
                },
                "timeout-minutes": {"type": "integer", "examples": [20]},
                "engine": {"$ref": "#/$defs/engine"}
            },
            "$defs": {
                "engine": {
                    "oneOf": [
                        {"type": "string", "enum": ["claude", "copilot"]},
                        {"type": "object", "properties": {"id": {"type": "string"}}}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_misplaced_typo_points_to_correct_block() {
        let text = unknown_property_suggestions(&schema(), "/actions", "skip-if-mach").join("\n");
        assert!(text.contains("Did you mean"), "{text}");
        assert!(text.contains("skip-if-match"), "{text}");
        assert!(text.contains("belongs under /on"), "{text}");
    }

    #[test]
    fn test_close_match_in_place() {
        let suggestions = unknown_property_suggestions(&schema(), "", "timeout-minute");
        assert_eq!(suggestions, vec!["Did you mean 'timeout-minutes'?"]);
    }

    #[test]
    fn test_placement_reported_alongside_close_match() {
        let schema = json!({
            "type": "object",
            "properties": {
                "network": {"type": "object", "properties": {"allowed": {"type": "array"}}},
                "safe-outputs": {"type": "object", "properties": {"allowed": {"type": "array"}}}
            }
        });
        let suggestions = unknown_property_suggestions(&schema, "/network", "allowd");
        assert_eq!(
            suggestions,
            vec![
                "Did you mean 'allowed'?".to_string(),
                "Did you mean 'allowed'? 'allowed' belongs under /safe-outputs".to_string(),
            ]
        );
    }

    #[test]
    fn test_lists_valid_properties_when_nothing_close() {
        let suggestions = unknown_property_suggestions(&schema(), "/actions", "zzzzzzzzzzzz");
        assert_eq!(suggestions, vec!["Valid properties at /actions: pin, update"]);
    }

    #[test]
    fn test_ref_and_one_of_are_followed() {
        assert_eq!(properties_at(&schema(), &["engine".to_string()]), vec!["id"]);
        assert_eq!(expected_type(&schema(), &["engine".to_string()]), "object or string");
    }

    #[test]
    fn test_enum_suggestions() {
        let allowed = vec!["claude".to_string(), "copilot".to_string()];
        assert_eq!(
            enum_suggestions(&json!("copilt"), &allowed),
            vec!["Did you mean 'copilot'?", "Allowed values: claude, copilot"]
        );
    }

    #[test]
    fn test_type_examples() {
        let s = schema();
        assert_eq!(type_example(&s, &["timeout-minutes".to_string()]).as_deref(), Some("20"));
        let pin = ["actions".to_string(), "pin".to_string()];
        assert_eq!(type_example(&s, &pin).as_deref(), Some("true"));
    }

    #[test]
    fn test_distance_threshold() {
        assert_eq!(max_distance("abc"), 2);
        assert_eq!(max_distance("permissions-extra"), 5);
    }

    #[test]
    fn test_pointer_helpers() {
        assert_eq!(pointer_segments("/on/a~1b"), vec!["on", "a/b"]);
        assert!(pointer_segments("").is_empty());
        assert_eq!(display_pointer(""), "the top level");
    }
}
