//! Pre-flight checks before expensive operations.
//!
//! Validates that the provider is reachable in principle (an API key is
//! present) before starting a run that would otherwise fail on its first
//! completion call.

use crate::config::ProviderSettings;
use crate::error::{Result, RoundtableError};

/// Check that the API key variable named in the provider settings is set.
pub fn check_api_key(provider: &ProviderSettings) -> Result<()> {
    let var = &provider.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(RoundtableError::Configuration(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(RoundtableError::Configuration(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_names_variable() {
        let provider = ProviderSettings {
            api_key_env: "ROUNDTABLE_PREFLIGHT_UNSET_KEY".to_string(),
            ..ProviderSettings::default()
        };
        let err = check_api_key(&provider).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.to_string().contains("ROUNDTABLE_PREFLIGHT_UNSET_KEY not set"));
    }
}
