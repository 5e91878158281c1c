//! Chat assistant: model providers, prompt assembly and follow-up suggestions

pub mod factory;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod suggestions;

pub use factory::create_provider;
pub use model::{GenerationConfig, ModelProvider, ModelResponse, ProviderKind, ProviderMetadata};
pub use prompt::{MarketSnapshot, PromptBuilder, ASSISTANT_PERSONA};
pub use suggestions::suggest;
