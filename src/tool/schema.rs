//! Typed parameter schemas for tools.
//!
//! A [`ParameterSchema`] is declared once when a tool is registered and is
//! rendered to JSON Schema both for the model (function definitions) and for
//! argument validation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named parameter with its type and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Parameter {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: true,
            minimum: None,
            maximum: None,
            allowed: None,
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Restrict the parameter to a fixed set of values.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Advertised default; handlers apply it themselves when the argument is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(self.param_type.as_str()));
        if !self.description.is_empty() {
            property.insert("description".to_string(), json!(self.description));
        }
        if let Some(min) = self.minimum {
            property.insert("minimum".to_string(), json!(min));
        }
        if let Some(max) = self.maximum {
            property.insert("maximum".to_string(), json!(max));
        }
        if let Some(ref allowed) = self.allowed {
            property.insert("enum".to_string(), Value::Array(allowed.clone()));
        }
        if let Some(ref default) = self.default {
            property.insert("default".to_string(), default.clone());
        }
        Value::Object(property)
    }
}

/// Ordered set of parameters accepted by a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    params: Vec<Parameter>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. A later parameter with the same name replaces the earlier one.
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
        self
    }

    pub fn required(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.param(Parameter::required(name, param_type, description))
    }

    pub fn optional(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.param(Parameter::optional(name, param_type, description))
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render as a closed JSON Schema object: unknown parameters are rejected.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}
