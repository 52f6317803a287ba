//! Tool registry: name-unique registration and call resolution.

use super::{ToolError, ToolErrorKind, ToolSpec};
use crate::error::{Result, RoundtableError};
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Collection of tools available to one or more agents.
///
/// Registration needs `&mut self`; once the registry is wrapped in an `Arc`
/// and handed to agents it is read-only and can be shared across teams.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolSpec>,
    order: Vec<String>,
    default_timeout: Option<Duration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout applied to tools that do not set their own.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, spec: ToolSpec) -> Result<()> {
        if self.tools.contains_key(spec.name()) {
            return Err(RoundtableError::Configuration(format!(
                "Tool '{}' is already registered",
                spec.name()
            )));
        }
        debug!("Registered tool: {}", spec.name());
        self.order.push(spec.name().to_string());
        self.tools.insert(spec.name().to_string(), spec);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_tool(mut self, spec: ToolSpec) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered specs in registration order.
    pub fn specs(&self) -> Vec<&ToolSpec> {
        self.order.iter().filter_map(|name| self.tools.get(name)).collect()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve a requested call.
    ///
    /// Every failure (unknown tool, invalid arguments, handler error or panic,
    /// timeout) comes back as a [`ToolError`] value; nothing here aborts the
    /// caller's conversation.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn resolve(&self, name: &str, arguments: &Value) -> std::result::Result<Value, ToolError> {
        let spec = self.tools.get(name).ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::NotFound,
                format!("No tool named '{}'. Available: {}", name, self.order.join(", ")),
            )
        })?;

        let args = spec.validate_arguments(arguments)?;

        let call = AssertUnwindSafe(spec.handler().call(args)).catch_unwind();
        let outcome = match spec.timeout().or(self.default_timeout) {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Tool {} timed out after {:?}", name, limit);
                    return Err(ToolError::new(
                        ToolErrorKind::Timeout,
                        format!("'{}' did not finish within {:?}", name, limit),
                    ));
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Tool {} failed: {:#}", name, e);
                Err(ToolError::new(ToolErrorKind::ExecutionFailed, format!("{:#}", e)))
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                warn!("Tool {} panicked: {}", name, detail);
                Err(ToolError::new(ToolErrorKind::ExecutionFailed, format!("panic: {}", detail)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamType, ParameterSchema};
    use serde_json::json;

    fn double() -> ToolSpec {
        ToolSpec::from_fn(
            "double",
            "Double an integer",
            ParameterSchema::new().required("n", ParamType::Integer, "Value to double"),
            |args| Ok(json!(args.i64("n").unwrap_or_default() * 2)),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(double()).unwrap();

        let err = registry.register(double()).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_specs_keep_registration_order() {
        let noop = |name: &str| {
            ToolSpec::from_fn(name, "", ParameterSchema::new(), |_| Ok(Value::Null)).unwrap()
        };
        let registry = ToolRegistry::new()
            .with_tool(noop("zeta"))
            .unwrap()
            .with_tool(noop("alpha"))
            .unwrap();
        let names: Vec<&str> = registry.specs().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let registry = ToolRegistry::new().with_tool(double()).unwrap();
        let first = tokio_test::block_on(registry.resolve("double", &json!({"n": 21})));
        let second = tokio_test::block_on(registry.resolve("double", &json!({"n": 21})));
        assert_eq!(first, Ok(json!(42)));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_handler() {
        let spec = ToolSpec::from_fn(
            "double",
            "",
            ParameterSchema::new().required("n", ParamType::Integer, ""),
            |_| panic!("handler must not run"),
        )
        .unwrap();
        let registry = ToolRegistry::new().with_tool(spec).unwrap();

        for args in [json!({"n": "abc"}), json!({}), json!({"n": 1, "extra": true})] {
            let err = registry.resolve("double", &args).await.unwrap_err();
            assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
        }
    }

    #[tokio::test]
    async fn test_handler_error_is_captured() {
        let spec = ToolSpec::new("fails", "", ParameterSchema::new(), |_| async {
            Err::<Value, _>(anyhow::anyhow!("upstream unavailable"))
        })
        .unwrap();
        let registry = ToolRegistry::new().with_tool(spec).unwrap();

        let err = registry.resolve("fails", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
        assert!(err.detail.contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_captured() {
        let spec = ToolSpec::from_fn("boom", "", ParameterSchema::new(), |_| panic!("kaboom")).unwrap();
        let registry = ToolRegistry::new().with_tool(spec).unwrap();

        let err = registry.resolve("boom", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
        assert!(err.detail.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new().with_tool(double()).unwrap();
        let err = registry.resolve("triple", &json!({"n": 1})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
        assert!(err.detail.contains("double"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let spec = ToolSpec::new("slow", "", ParameterSchema::new(), |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, anyhow::Error>(Value::Null)
        })
        .unwrap()
        .with_timeout(Duration::from_millis(20));
        let registry = ToolRegistry::new().with_tool(spec).unwrap();

        let err = registry.resolve("slow", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_whole_float_integer_reaches_handler() {
        let spec = ToolSpec::from_fn(
            "double",
            "",
            ParameterSchema::new().required("n", ParamType::Integer, ""),
            |args| match args.i64("n") {
                Some(n) => Ok(json!(n * 2)),
                None => anyhow::bail!("n missing"),
            },
        )
        .unwrap();
        let registry = ToolRegistry::new().with_tool(spec).unwrap();

        assert_eq!(registry.resolve("double", &json!({"n": 21.0})).await, Ok(json!(42)));
        assert_eq!(registry.resolve("double", &json!({"n": 21})).await, Ok(json!(42)));
    }
}
