// file: src/llm/mod.rs
// description: generative model abstraction and its implementations
// reference: internal module structure

pub mod client;
pub mod fallback;
pub mod prompt;
pub mod structure;

pub use client::ChatCompletionClient;
pub use fallback::FallbackModel;
pub use prompt::PromptTemplate;
pub use structure::structure_documentation;

use crate::config::GenerationConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// External service that turns a prompt into documentation text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn name(&self) -> &str;

    /// False for models that answer without a network round trip.
    fn is_remote(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Remote client when an API key is configured, otherwise the offline fallback.
pub fn build_model(config: &GenerationConfig) -> Result<Arc<dyn GenerativeModel>> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(Arc::new(ChatCompletionClient::new(config)?)),
        _ => {
            warn!("No generation API key configured, using offline fallback model");
            Ok(Arc::new(FallbackModel::new()))
        }
    }
}
