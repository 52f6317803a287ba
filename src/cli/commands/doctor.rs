//! Doctor command - verify configuration and API access.

use crate::cli::Output;
use crate::config::{ProviderSettings, Settings};
use crate::tool::builtin;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    Output::header("Roundtable Doctor");
    println!();
    println!("Checking configuration and API access...\n");

    let mut checks = Vec::new();

    println!("{}", style("Provider").bold());
    let provider_checks = vec![
        check_api_key(&settings.provider, std::env::var(&settings.provider.api_key_env).ok()),
        check_endpoint(&settings.provider),
    ];
    for check in &provider_checks {
        check.print();
    }
    checks.extend(provider_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_defaults(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Tools").bold());
    let tools_check = match builtin::registry() {
        Ok(registry) => CheckResult::ok("Built-in tools", &registry.names().join(", ")),
        Err(e) => CheckResult::error("Built-in tools", &e.to_string(), "Please report this as a bug"),
    };
    tools_check.print();
    checks.push(tools_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running a team.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Roundtable is ready to use.");
    }

    Ok(())
}

/// Check the API key variable named in the provider settings.
fn check_api_key(provider: &ProviderSettings, value: Option<String>) -> CheckResult {
    let name = provider.api_key_env.as_str();
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(
            name,
            "empty",
            &format!("Set with: export {}='...'", name),
        ),
        Some(key) if key.len() > 12 && key.is_ascii() => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok(name, &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(
            name,
            "set but unusually short",
            "Check that the full key was copied",
        ),
        None => CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {}='...'", name),
        ),
    }
}

fn check_endpoint(provider: &ProviderSettings) -> CheckResult {
    match provider.api_base {
        None => CheckResult::ok(
            "Endpoint",
            &format!("OpenAI default (model {})", provider.model),
        ),
        Some(ref base) if base.starts_with("http://") || base.starts_with("https://") => {
            CheckResult::ok("Endpoint", &format!("{} (model {})", base, provider.model))
        }
        Some(ref base) => CheckResult::error(
            "Endpoint",
            &format!("'{}' is not an http(s) URL", base),
            "Fix [provider] api_base in the config file",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(path: Option<&Path>) -> CheckResult {
    let config_path = path
        .map(|p| Settings::expand_path(&p.to_string_lossy()))
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: roundtable config init",
        )
    }
}

fn check_defaults(settings: &Settings) -> CheckResult {
    let defaults = &settings.defaults;
    if defaults.max_tool_iterations < 1 {
        return CheckResult::error(
            "Agent defaults",
            "max_tool_iterations is 0",
            "Set [defaults] max_tool_iterations to at least 1",
        );
    }

    let describe = |secs: u64| {
        if secs == 0 {
            "none".to_string()
        } else {
            format!("{}s", secs)
        }
    };
    CheckResult::ok(
        "Agent defaults",
        &format!(
            "{} tool round(s), completion timeout {}, tool timeout {}",
            defaults.max_tool_iterations,
            describe(defaults.completion_timeout_secs),
            describe(defaults.tool_timeout_secs)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_api_key() {
        let provider = ProviderSettings::default();
        assert_eq!(check_api_key(&provider, None).status, CheckStatus::Error);
        assert_eq!(
            check_api_key(&provider, Some(" ".to_string())).status,
            CheckStatus::Error
        );
        assert_eq!(
            check_api_key(&provider, Some("short".to_string())).status,
            CheckStatus::Warning
        );
        let ok = check_api_key(&provider, Some("sk-proj-abcdefghijklmnop".to_string()));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (sk-p...mnop)");
    }

    #[test]
    fn test_check_endpoint() {
        let mut provider = ProviderSettings::default();
        assert_eq!(check_endpoint(&provider).status, CheckStatus::Ok);
        provider.api_base = Some("localhost:8080".to_string());
        assert_eq!(check_endpoint(&provider).status, CheckStatus::Error);
    }

    #[test]
    fn test_check_defaults() {
        let mut settings = Settings::default();
        assert_eq!(check_defaults(&settings).status, CheckStatus::Ok);
        settings.defaults.max_tool_iterations = 0;
        assert_eq!(check_defaults(&settings).status, CheckStatus::Error);
    }
}
