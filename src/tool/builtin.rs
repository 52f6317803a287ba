//! Built-in tools available to teams defined in configuration files.

use super::{ParamType, Parameter, ParameterSchema, ToolRegistry, ToolSpec};
use crate::error::Result;
use anyhow::bail;
use chrono::Utc;
use serde_json::json;
use std::fmt::Write;

/// Current UTC date and time.
pub fn current_time() -> Result<ToolSpec> {
    ToolSpec::from_fn(
        "current_time",
        "Get the current UTC date and time. Use this when the task depends on today's date.",
        ParameterSchema::new().param(
            Parameter::optional(
                "format",
                ParamType::String,
                "strftime format string (default: RFC 3339)",
            )
            .default_value("%+"),
        ),
        |args| {
            let format = args.str("format").unwrap_or("%+");
            let mut rendered = String::new();
            // An invalid format specifier surfaces as a fmt::Error
            if write!(rendered, "{}", Utc::now().format(format)).is_err() {
                bail!("invalid time format '{}'", format);
            }
            Ok(json!(rendered))
        },
    )
}

/// Basic arithmetic on two numbers.
pub fn calculator() -> Result<ToolSpec> {
    ToolSpec::from_fn(
        "calculator",
        "Apply an arithmetic operation to two numbers and return the result.",
        ParameterSchema::new()
            .param(
                Parameter::required("operation", ParamType::String, "Operation to apply")
                    .one_of(["add", "subtract", "multiply", "divide"]),
            )
            .required("a", ParamType::Number, "Left operand")
            .required("b", ParamType::Number, "Right operand"),
        |args| {
            let a = args.f64("a").unwrap_or_default();
            let b = args.f64("b").unwrap_or_default();
            let result = match args.str("operation").unwrap_or_default() {
                "add" => a + b,
                "subtract" => a - b,
                "multiply" => a * b,
                "divide" => {
                    if b == 0.0 {
                        bail!("division by zero");
                    }
                    a / b
                }
                other => bail!("unsupported operation '{}'", other),
            };
            Ok(json!(result))
        },
    )
}

/// Registry holding every built-in tool.
pub fn registry() -> Result<ToolRegistry> {
    ToolRegistry::new()
        .with_tool(current_time()?)?
        .with_tool(calculator()?)
}
