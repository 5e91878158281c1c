//! Model provider abstraction

use crate::config::ModelConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    Gemini,
}

impl ProviderKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Some(Self::Mock),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Gemini => "gemini",
        }
    }
}

/// Sampling parameters for a single generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
}

impl From<&ModelConfig> for GenerationConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_output_tokens),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub supported_models: Vec<String>,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<ModelResponse>;

    fn metadata(&self) -> ProviderMetadata;

    fn kind(&self) -> ProviderKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("Gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::from_str(" mock "), Some(ProviderKind::Mock));
        assert_eq!(ProviderKind::from_str("openai"), None);
        assert_eq!(ProviderKind::Gemini.as_str(), "gemini");
    }

    #[test]
    fn test_generation_config_from_model_config() {
        let model = ModelConfig {
            temperature: 0.3,
            max_output_tokens: 256,
            ..Default::default()
        };
        let config = GenerationConfig::from(&model);
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.max_tokens, Some(256));
        assert!(config.stop_sequences.is_none());
    }
}
