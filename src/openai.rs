//! OpenAI-compatible client configuration with sensible defaults.

use crate::config::ProviderSettings;
use crate::error::{Result, RoundtableError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for completion requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for the default OpenAI endpoint, reading `OPENAI_API_KEY`.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(OpenAIConfig::default(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client from provider settings.
///
/// `api_base` selects any OpenAI-compatible endpoint (Gemini, Groq, a local
/// server); the key is read from the environment variable named by
/// `api_key_env`.
pub fn create_client_from_settings(settings: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new();
    if let Some(ref base) = settings.api_base {
        config = config.with_api_base(base);
    }
    if let Ok(key) = std::env::var(&settings.api_key_env) {
        config = config.with_api_key(key);
    }
    create_client_with_timeout(config, Duration::from_secs(settings.request_timeout_secs))
}

/// Create a client with a custom HTTP timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RoundtableError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
