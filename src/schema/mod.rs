//! Frontmatter validation against the embedded JSON schemas.
//!
//! Two schemas ship with the binary: the strict main-workflow schema applied
//! to root workflows, and a permissive included-file schema applied to
//! imported fragments. Both are compiled once on first use.
//!
//! Violations are turned into [`AwfError::Schema`] values that point at the
//! offending line of the original document and carry suggestions produced by
//! [`suggestions`].

pub mod location;
pub mod suggestions;

use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use std::sync::OnceLock;

use crate::core::{AwfError, SchemaErrorKind};
use crate::markdown::Frontmatter;

/// Embedded main workflow schema (compiled at build time)
const MAIN_WORKFLOW_SCHEMA: &str = include_str!("../../schemas/main_workflow_schema.json");

/// Embedded schema for imported files
const INCLUDED_FILE_SCHEMA: &str = include_str!("../../schemas/included_file_schema.json");

static MAIN_WORKFLOW: OnceLock<Result<SchemaValidator, String>> = OnceLock::new();
static INCLUDED_FILE: OnceLock<Result<SchemaValidator, String>> = OnceLock::new();

/// Message prefixes that carry no information for users.
const NOISE_PREFIXES: &[&str] = &["jsonschema validation failed", "- at '':", ":"];

/// A compiled schema together with its source, which the suggestion engine
/// navigates.
pub struct SchemaValidator {
    schema: Value,
    validator: Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Validator for root workflow frontmatter.
    pub fn main_workflow() -> Result<&'static Self, AwfError> {
        cached(&MAIN_WORKFLOW, MAIN_WORKFLOW_SCHEMA)
    }

    /// Validator for imported (shared) file frontmatter.
    pub fn included_file() -> Result<&'static Self, AwfError> {
        cached(&INCLUDED_FILE, INCLUDED_FILE_SCHEMA)
    }

    /// Compile a validator from an in-memory schema.
    ///
    /// # Errors
    ///
    /// [`AwfError::Config`] when the schema itself is invalid.
    pub fn from_schema(schema: Value) -> Result<Self, AwfError> {
        let validator = Validator::new(&schema).map_err(|e| AwfError::Config {
            message: format!("Failed to compile schema: {e}"),
        })?;
        Ok(Self {
            schema,
            validator,
        })
    }

    /// The schema this validator was compiled from.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate `frontmatter`, returning the first violation.
    ///
    /// `raw_frontmatter` and `line_offset` map instance paths back to the
    /// original document; without raw text errors point at `line_offset`.
    pub fn validate(
        &self,
        frontmatter: &Frontmatter,
        file: &str,
        raw_frontmatter: Option<&str>,
        line_offset: usize,
    ) -> Result<(), AwfError> {
        let errors = self.validate_all(frontmatter, file, raw_frontmatter, line_offset);
        match errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Validate `frontmatter`, returning every violation in schema order.
    pub fn validate_all(
        &self,
        frontmatter: &Frontmatter,
        file: &str,
        raw_frontmatter: Option<&str>,
        line_offset: usize,
    ) -> Vec<AwfError> {
        let instance = Value::Object(frontmatter.clone());
        let raw = raw_frontmatter.unwrap_or_default();
        self.validator
            .iter_errors(&instance)
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let violation = self.describe(&error.kind, &pointer, &error.instance, &error);
                let mut segments = suggestions::pointer_segments(&pointer);
                if let Some(property) = &violation.located_property {
                    segments.push(property.clone());
                }
                let (line, column) = location::locate(raw, line_offset, &segments);
                AwfError::Schema {
                    file: file.to_string(),
                    line,
                    column,
                    kind: violation.kind,
                    message: violation.message,
                    suggestions: violation.suggestions,
                }
            })
            .collect()
    }

    fn describe(
        &self,
        kind: &ValidationErrorKind,
        pointer: &str,
        instance: &Value,
        error: &dyn std::fmt::Display,
    ) -> Violation {
        let at = suggestions::display_pointer(pointer);
        let segments = suggestions::pointer_segments(pointer);
        match kind {
            ValidationErrorKind::AdditionalProperties {
                unexpected,
            } => {
                let property = unexpected.first().cloned().unwrap_or_default();
                let extra = if unexpected.len() > 1 {
                    format!(" (and {} more)", unexpected.len() - 1)
                } else {
                    String::new()
                };
                Violation {
                    message: format!("Unknown property '{property}' at {at}{extra}"),
                    suggestions: suggestions::unknown_property_suggestions(
                        &self.schema,
                        pointer,
                        &property,
                    ),
                    located_property: Some(property.clone()),
                    kind: SchemaErrorKind::UnknownProperty {
                        property,
                    },
                }
            }
            ValidationErrorKind::Enum {
                options,
            } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|values| values.iter().map(render_literal).collect())
                    .unwrap_or_default();
                let value = render_literal(instance);
                Violation {
                    message: format!("Value '{value}' at {at} is not one of the allowed values"),
                    suggestions: suggestions::enum_suggestions(instance, &allowed),
                    located_property: None,
                    kind: SchemaErrorKind::EnumViolation {
                        value,
                        allowed,
                    },
                }
            }
            ValidationErrorKind::Required {
                property,
            } => {
                let property = render_literal(property);
                Violation {
                    message: format!("Missing required property '{property}' at {at}"),
                    suggestions: Vec::new(),
                    located_property: None,
                    kind: SchemaErrorKind::MissingRequired {
                        property,
                    },
                }
            }
            ValidationErrorKind::Type {
                ..
            } => {
                let expected = suggestions::expected_type(&self.schema, &segments);
                let suggestions = suggestions::type_example(&self.schema, &segments)
                    .map(|example| vec![format!("Use a value like {example}")])
                    .unwrap_or_default();
                Violation {
                    message: format!(
                        "Value at {at} must be {expected}, found {}",
                        crate::markdown::frontmatter::json_type_name(instance)
                    ),
                    suggestions,
                    located_property: None,
                    kind: SchemaErrorKind::WrongType {
                        expected,
                    },
                }
            }
            _ => Violation {
                message: clean_message(&format!("{at}: {error}")),
                suggestions: Vec::new(),
                located_property: None,
                kind: SchemaErrorKind::Other,
            },
        }
    }
}

/// Intermediate description of one violation.
struct Violation {
    kind: SchemaErrorKind,
    message: String,
    suggestions: Vec<String>,
    /// Property to append to the instance path when locating the violation
    located_property: Option<String>,
}

fn cached(
    cell: &'static OnceLock<Result<SchemaValidator, String>>,
    source: &str,
) -> Result<&'static SchemaValidator, AwfError> {
    let result = cell.get_or_init(|| {
        let schema: Value = serde_json::from_str(source)
            .map_err(|e| format!("Failed to parse embedded schema: {e}"))?;
        SchemaValidator::from_schema(schema).map_err(|e| e.to_string())
    });
    result.as_ref().map_err(|message| AwfError::Config {
        message: message.clone(),
    })
}

/// Strings without quotes, everything else as compact JSON.
fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strip validator boilerplate from a message and make it a sentence.
pub fn clean_message(message: &str) -> String {
    let mut text = message.trim();
    loop {
        let before = text;
        for prefix in NOISE_PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                text = rest.trim_start();
            }
        }
        if before == text {
            break;
        }
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut sentence: String = first.to_uppercase().chain(chars).collect();
            if !sentence.ends_with('.') && !sentence.ends_with('?') {
                sentence.push('.');
            }
            sentence
        }
        None => "Invalid frontmatter.".to_string(),
    }
}
