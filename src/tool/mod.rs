//! Tools agents can call mid-turn.
//!
//! A [`ToolSpec`] wraps an ordinary sync or async callable together with the
//! parameter schema the model sees. Specs are collected in a
//! [`ToolRegistry`], which validates requested arguments and dispatches calls.

pub mod builtin;
mod registry;
mod schema;

pub use registry::ToolRegistry;
pub use schema::{ParamType, Parameter, ParameterSchema};

use crate::error::{Result, RoundtableError};
use crate::schema::Validator;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Category of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Missing required parameter, wrong type, or unknown extra parameter.
    InvalidArguments,
    /// The handler returned an error or panicked.
    ExecutionFailed,
    /// The handler did not finish within its timeout.
    Timeout,
    /// No tool with the requested name is available to the agent.
    NotFound,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ToolErrorKind::InvalidArguments => "invalid arguments",
            ToolErrorKind::ExecutionFailed => "execution failed",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::NotFound => "tool not found",
        };
        f.write_str(name)
    }
}

/// A failed tool call. Recorded in the conversation as data so the agent can react.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Tool error ({kind}): {detail}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub detail: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Validated arguments handed to a tool handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Integer argument. Whole-number floats such as `21.0` count as integers.
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(integral)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    /// Deserialize the whole argument map into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        let f = value.as_f64()?;
        // i64::MAX as f64 rounds up to 2^63, which is out of range
        (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
            .then_some(f as i64)
    })
}

/// Callable behind a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> anyhow::Result<Value>;
}

struct AsyncFnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for AsyncFnHandler<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn call(&self, args: ToolArgs) -> anyhow::Result<Value> {
        (self.0)(args).await
    }
}

struct SyncFnHandler<F>(F);

#[async_trait]
impl<F> ToolHandler for SyncFnHandler<F>
where
    F: Fn(ToolArgs) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, args: ToolArgs) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}

/// A named, schema-described operation an agent may request.
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    parameters: ParameterSchema,
    validator: Validator,
    handler: Arc<dyn ToolHandler>,
    is_async: bool,
    timeout: Option<Duration>,
}

impl ToolSpec {
    /// Wrap an async callable.
    pub fn new<F, Fut>(
        name: &str,
        description: &str,
        parameters: ParameterSchema,
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::with_handler(name, description, parameters, Arc::new(AsyncFnHandler(handler)), true)
    }

    /// Wrap a synchronous callable.
    pub fn from_fn<F>(
        name: &str,
        description: &str,
        parameters: ParameterSchema,
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(ToolArgs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::with_handler(name, description, parameters, Arc::new(SyncFnHandler(handler)), false)
    }

    /// Build a spec around an existing handler object.
    pub fn with_handler(
        name: &str,
        description: &str,
        parameters: ParameterSchema,
        handler: Arc<dyn ToolHandler>,
        is_async: bool,
    ) -> Result<Self> {
        validate_tool_name(name)?;
        let validator = Validator::compile(&parameters.to_json_schema()).map_err(|e| {
            RoundtableError::Configuration(format!("Invalid parameter schema for '{}': {}", name, e))
        })?;

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            validator,
            handler,
            is_async,
            timeout: None,
        })
    }

    /// Set a per-call timeout, overriding the registry default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check raw arguments against the parameter schema.
    pub fn validate_arguments(&self, arguments: &Value) -> std::result::Result<ToolArgs, ToolError> {
        let map = match arguments {
            Value::Object(map) => map.clone(),
            // Providers send an empty payload for parameterless calls
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::new(
                    ToolErrorKind::InvalidArguments,
                    format!("arguments must be a JSON object, got {}", other),
                ))
            }
        };

        let object = Value::Object(map);
        self.validator.check(&object).map_err(|errors| {
            ToolError::new(ToolErrorKind::InvalidArguments, errors.join("; "))
        })?;

        let Value::Object(mut map) = object else {
            return Ok(ToolArgs::default());
        };
        // JSON Schema accepts 21.0 as an integer; hand handlers 21
        for param in self.parameters.params() {
            if param.param_type != ParamType::Integer {
                continue;
            }
            if let Some(value) = map.get_mut(&param.name) {
                if !value.is_i64() && !value.is_u64() {
                    if let Some(n) = integral(value) {
                        *value = Value::from(n);
                    }
                }
            }
        }
        Ok(ToolArgs::new(map))
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("is_async", &self.is_async)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Tool names follow the function-name rules of chat completion APIs.
fn validate_tool_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RoundtableError::Configuration(format!(
            "Invalid tool name '{}': use 1-64 ASCII letters, digits, '_' or '-'",
            name
        )))
    }
}
