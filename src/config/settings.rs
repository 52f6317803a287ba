//! Configuration settings for Roundtable.

use crate::error::{Result, RoundtableError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub provider: ProviderSettings,
    pub defaults: AgentDefaults,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Directory where `run --transcript` resolves relative paths.
    pub transcript_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            transcript_dir: ".".to_string(),
        }
    }
}

/// Completion provider settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL; `None` uses the OpenAI default.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model used by agents that do not name one.
    pub model: String,
    /// Sampling temperature; `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// HTTP timeout for a single request.
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            request_timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Defaults applied to every agent of a team unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    /// Tool round-trips allowed within one turn.
    pub max_tool_iterations: usize,
    /// Time limit for one completion call (0 disables it).
    pub completion_timeout_secs: u64,
    /// Time limit for one tool call (0 disables it).
    pub tool_timeout_secs: u64,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            max_tool_iterations: crate::agent::DEFAULT_MAX_TOOL_ITERATIONS,
            completion_timeout_secs: 120,
            tool_timeout_secs: 30,
        }
    }
}

impl AgentDefaults {
    pub fn completion_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.completion_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.tool_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RoundtableError::Configuration(e.to_string()))
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roundtable")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Resolve a transcript path against the configured transcript directory.
    pub fn transcript_path(&self, path: &str) -> PathBuf {
        let expanded = Self::expand_path(path);
        if expanded.is_absolute() {
            expanded
        } else {
            Self::expand_path(&self.general.transcript_dir).join(expanded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.defaults.max_tool_iterations, 10);
        assert_eq!(settings.defaults.tool_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[provider]
api_base = "https://generativelanguage.googleapis.com/v1beta/openai"
api_key_env = "GEMINI_API_KEY"
model = "gemini-2.0-flash"

[defaults]
completion_timeout_secs = 0
"#,
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.provider.model, "gemini-2.0-flash");
        assert_eq!(settings.provider.request_timeout_secs, 300);
        assert_eq!(settings.defaults.completion_timeout(), None);
        assert_eq!(settings.defaults.max_tool_iterations, 10);
        assert_eq!(settings.general.log_level, "warn");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.provider.temperature = Some(0.2);
        settings.defaults.max_tool_iterations = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.provider.temperature, Some(0.2));
        assert_eq!(loaded.defaults.max_tool_iterations, 3);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nmodel = 1").unwrap();
        assert!(matches!(
            Settings::load_from(Some(&path)),
            Err(RoundtableError::TomlParse(_))
        ));
    }

    #[test]
    fn test_transcript_path() {
        let mut settings = Settings::default();
        settings.general.transcript_dir = "/var/runs".to_string();
        assert_eq!(settings.transcript_path("a.json"), PathBuf::from("/var/runs/a.json"));
        assert_eq!(settings.transcript_path("/tmp/b.json"), PathBuf::from("/tmp/b.json"));
    }
}
