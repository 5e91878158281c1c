//! Offline provider returning canned replies

use crate::assistant::model::{
    GenerationConfig, ModelProvider, ModelResponse, ProviderKind, ProviderMetadata,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DEFAULT_REPLY: &str = "I can help you price industrial by-products, estimate CO2 savings \
and find cement plants that need your material. Tell me the material, quantity and city.";

/// Cycles through configured responses. With none configured it answers with a
/// short platform introduction that quotes the last line of the prompt.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Vec<String>>,
    cursor: Arc<AtomicUsize>,
    model_name: String,
    fail_with: Option<String>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Vec::new()),
            cursor: Arc::new(AtomicUsize::new(0)),
            model_name: "mock-model".to_string(),
            fail_with: None,
        }
    }
}

impl MockProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(responses),
            ..Default::default()
        }
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Make every call fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Default::default()
        }
    }

    fn next_reply(&self, prompt: &str) -> String {
        if self.responses.is_empty() {
            let question = prompt
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or_default()
                .trim();
            return format!("{DEFAULT_REPLY}\n\nYou asked: {question}");
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<ModelResponse> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }
        Ok(ModelResponse {
            content: self.next_reply(prompt),
            model: self.model_name.clone(),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Mock".to_string(),
            supported_models: vec![self.model_name.clone()],
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cycles_responses() {
        let provider = MockProvider::new(vec!["one".into(), "two".into()]);
        let config = GenerationConfig::default();
        assert_eq!(provider.generate("x", &config).await.unwrap().content, "one");
        assert_eq!(provider.generate("x", &config).await.unwrap().content, "two");
        assert_eq!(provider.generate("x", &config).await.unwrap().content, "one");
    }

    #[tokio::test]
    async fn test_default_reply_quotes_question() {
        let provider = MockProvider::default();
        let reply = provider
            .generate("system\n\nUser: what is fly ash worth?\n", &GenerationConfig::default())
            .await
            .unwrap();
        assert!(reply.content.contains("User: what is fly ash worth?"));
        assert_eq!(reply.model, "mock-model");
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = MockProvider::failing("quota exceeded");
        let err = provider
            .generate("hi", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
