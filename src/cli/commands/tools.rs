//! Tools command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::tool::{builtin, ToolSpec};
use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;

/// List the built-in tools.
pub fn run_tools(json: bool, settings: &Settings) -> Result<()> {
    let registry = builtin::registry()?;
    let default_timeout = settings.defaults.tool_timeout();

    if json {
        let definitions: Vec<Value> = registry
            .specs()
            .into_iter()
            .map(|spec| tool_definition(spec, default_timeout))
            .collect();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    Output::header(&format!("Built-in tools ({})", registry.len()));
    for spec in registry.specs() {
        print_tool(spec, default_timeout);
    }
    println!();
    Output::info("Enable a tool for an agent with `tools = [\"<name>\"]` in the team file.");
    Output::info(
        "Tools without their own timeout use [defaults] tool_timeout_secs (0 disables it).",
    );

    Ok(())
}

/// Where a tool's time limit comes from.
fn timeout_source(spec: &ToolSpec, default: Option<Duration>) -> (Option<Duration>, &'static str) {
    match spec.timeout() {
        Some(timeout) => (Some(timeout), "tool"),
        None => (default, "defaults"),
    }
}

fn tool_definition(spec: &ToolSpec, default_timeout: Option<Duration>) -> Value {
    let (timeout, source) = timeout_source(spec, default_timeout);
    json!({
        "name": spec.name(),
        "description": spec.description(),
        "parameters": spec.parameters().to_json_schema(),
        "timeout_secs": timeout.map(|t| t.as_secs_f64()),
        "timeout_source": source,
    })
}

fn print_tool(spec: &ToolSpec, default_timeout: Option<Duration>) {
    println!();
    Output::list_item(&format!("{} - {}", spec.name(), spec.description()));
    for param in spec.parameters().params() {
        let mut detail = format!(
            "{}{}",
            param.param_type,
            if param.required { "" } else { ", optional" }
        );
        if let Some(ref allowed) = param.allowed {
            let values: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            detail.push_str(&format!(", one of {}", values.join("|")));
        }
        if let Some(ref default) = param.default {
            detail.push_str(&format!(", default {}", default));
        }
        Output::kv(&param.name, &format!("{} ({})", param.description, detail));
    }

    let timeout = match timeout_source(spec, default_timeout) {
        (Some(limit), "tool") => format!("{:?}", limit),
        (Some(limit), _) => format!("{:?} (from [defaults])", limit),
        (None, _) => "none".to_string(),
    };
    Output::kv("timeout", &timeout);
}
