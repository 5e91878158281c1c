//! Provider Factory
//!
//! Creates model provider instances based on configuration.

use crate::assistant::model::{ModelProvider, ProviderKind};
use crate::assistant::prompt::ASSISTANT_PERSONA;
use crate::assistant::providers::{GeminiProvider, MockProvider};
use crate::config::ModelConfig;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Create a model provider from configuration
pub fn create_provider(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>> {
    let provider_kind = ProviderKind::from_str(&config.provider)
        .ok_or_else(|| anyhow!("Unknown provider: {}", config.provider))?;

    match provider_kind {
        ProviderKind::Mock => {
            let provider = match config.model_name {
                Some(ref model_name) => MockProvider::default().with_model_name(model_name.clone()),
                None => MockProvider::default(),
            };
            Ok(Arc::new(provider))
        }
        ProviderKind::Gemini => {
            let key_var = config
                .api_key_source
                .as_deref()
                .unwrap_or(DEFAULT_GEMINI_KEY_VAR);
            let provider = gemini_from_config(config, load_api_key_from_env(key_var)?)?;
            tracing::info!(model = ?config.model_name, key_var, "Using Gemini provider");
            Ok(Arc::new(provider))
        }
    }
}

/// Gemini client carrying the assistant persona as its system instruction
fn gemini_from_config(config: &ModelConfig, api_key: String) -> Result<GeminiProvider> {
    let mut provider = GeminiProvider::with_api_key(api_key)
        .with_system_instruction(ASSISTANT_PERSONA)
        .with_timeout(Duration::from_secs(config.timeout_secs))?;
    if let Some(ref model_name) = config.model_name {
        provider = provider.with_model(model_name.clone());
    }
    Ok(provider)
}

/// Load API key from environment variable
pub fn load_api_key_from_env(env_var: &str) -> Result<String> {
    let key = std::env::var(env_var).context(format!("Environment variable {} not set", env_var))?;
    if key.trim().is_empty() {
        return Err(anyhow!("Environment variable {} is empty", env_var));
    }
    Ok(key.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_create_mock_provider() {
        let config = ModelConfig {
            provider: "mock".to_string(),
            model_name: Some("test-model".to_string()),
            ..Default::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Mock);
        assert_eq!(provider.metadata().supported_models, vec!["test-model"]);
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = ModelConfig {
            provider: "unknown-provider".to_string(),
            ..Default::default()
        };

        assert!(create_provider(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_create_gemini_provider_from_custom_var() {
        std::env::set_var("CEMENTCYCLE_TEST_GEMINI_KEY", "secret");
        let config = ModelConfig {
            provider: "gemini".to_string(),
            api_key_source: Some("CEMENTCYCLE_TEST_GEMINI_KEY".to_string()),
            ..Default::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Gemini);
        std::env::remove_var("CEMENTCYCLE_TEST_GEMINI_KEY");
    }

    #[test]
    fn test_gemini_gets_persona_as_system_instruction() {
        let config = ModelConfig {
            provider: "gemini".to_string(),
            ..Default::default()
        };
        let provider = gemini_from_config(&config, "key".to_string()).unwrap();
        assert_eq!(provider.system_instruction(), Some(ASSISTANT_PERSONA));
    }

    #[test]
    #[serial]
    fn test_gemini_without_key_fails() {
        std::env::remove_var("CEMENTCYCLE_TEST_MISSING_KEY");
        let config = ModelConfig {
            provider: "gemini".to_string(),
            api_key_source: Some("CEMENTCYCLE_TEST_MISSING_KEY".to_string()),
            ..Default::default()
        };

        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("CEMENTCYCLE_TEST_MISSING_KEY"));
    }

    #[test]
    #[serial]
    fn test_load_api_key_from_env() {
        std::env::set_var("CEMENTCYCLE_TEST_API_KEY", "  env-key-value \n");
        let key = load_api_key_from_env("CEMENTCYCLE_TEST_API_KEY").unwrap();
        assert_eq!(key, "env-key-value");
        std::env::remove_var("CEMENTCYCLE_TEST_API_KEY");
    }
}
