//! JSON Schema validation for tool arguments and structured agent output.

use crate::error::{Result, RoundtableError};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::Arc;

/// A compiled JSON Schema, cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub(crate) struct Validator {
    compiled: Arc<JSONSchema>,
}

impl Validator {
    pub(crate) fn compile(schema: &Value) -> std::result::Result<Self, String> {
        let compiled = JSONSchema::compile(schema).map_err(|e| e.to_string())?;
        Ok(Self {
            compiled: Arc::new(compiled),
        })
    }

    /// Check `instance`, collecting every violation as `path: message`.
    pub(crate) fn check(&self, instance: &Value) -> std::result::Result<(), Vec<String>> {
        self.compiled.validate(instance).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect()
        })
    }
}

/// Structural contract an agent's final answer must satisfy.
#[derive(Clone)]
pub struct OutputSchema {
    name: String,
    schema: Value,
    validator: Validator,
    strict: bool,
}

impl OutputSchema {
    /// Compile `schema`; an invalid schema is a configuration error.
    pub fn new(name: impl Into<String>, schema: Value) -> Result<Self> {
        let name = name.into();
        let validator = Validator::compile(&schema).map_err(|e| {
            RoundtableError::Configuration(format!("Invalid output schema '{}': {}", name, e))
        })?;
        let strict = strict_compatible(&schema);
        Ok(Self {
            name,
            schema,
            validator,
            strict,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether providers can enforce the schema in strict mode: an object
    /// root, and every object closed (`additionalProperties: false`) with all
    /// of its properties required.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSchema")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("strict", &self.strict)
            .finish()
    }
}

/// Parse a final answer as JSON and check it against `schema`.
///
/// Returns the parsed value, or a description of why the payload does not
/// conform. Models sometimes wrap JSON in a Markdown code fence; the fence is
/// stripped before parsing.
pub fn validate(schema: &OutputSchema, payload: &str) -> std::result::Result<Value, String> {
    let body = strip_code_fence(payload);
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("output is not valid JSON: {}", e))?;

    schema
        .validator
        .check(&value)
        .map_err(|errors| errors.join("; "))?;

    Ok(value)
}

fn strict_compatible(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object") && closed(schema)
}

fn closed(node: &Value) -> bool {
    let Some(node) = node.as_object() else {
        return true;
    };

    if let Some(properties) = node.get("properties").and_then(Value::as_object) {
        if node.get("additionalProperties") != Some(&Value::Bool(false)) {
            return false;
        }
        let required: Vec<&str> = node
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if !properties.keys().all(|key| required.contains(&key.as_str())) {
            return false;
        }
        if !properties.values().all(closed) {
            return false;
        }
    } else if node.get("type").and_then(Value::as_str) == Some("object")
        && node.get("additionalProperties") != Some(&Value::Bool(false))
    {
        return false;
    }

    if let Some(items) = node.get("items") {
        if !closed(items) {
            return false;
        }
    }
    ["anyOf", "$defs", "definitions"].iter().all(|key| match node.get(*key) {
        Some(Value::Array(variants)) => variants.iter().all(closed),
        Some(Value::Object(defs)) => defs.values().all(closed),
        _ => true,
    })
}

fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag line (```json)
    match rest.find('\n') {
        Some(idx) => rest[idx + 1..].trim(),
        None => rest.trim(),
    }
}
