use std::sync::Arc;

use super::hashing::HashingEmbedder;
use super::openai::{OpenAiChatModel, OpenAiEmbedder};
use super::provider::{EmbeddingProvider, LanguageModel};
use crate::core::config::{EmbeddingBackend, Settings};
use crate::core::errors::RagError;

/// Constructs the process-wide provider handles. Called at most once per
/// handle, on first use.
pub trait ProviderFactory: Send + Sync {
    fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, RagError>;

    fn language_model(&self) -> Result<Arc<dyn LanguageModel>, RagError>;
}

#[derive(Clone)]
pub struct SettingsProviderFactory {
    settings: Settings,
}

impl SettingsProviderFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl ProviderFactory for SettingsProviderFactory {
    fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
        let embedding = &self.settings.embedding;
        match embedding.backend {
            EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(embedding.dimension))),
            EmbeddingBackend::OpenAi => {
                let api_key = embedding.api_key.clone().ok_or_else(|| {
                    RagError::Configuration(
                        "embedding.api_key is required for the openai embedding provider".into(),
                    )
                })?;
                Ok(Arc::new(OpenAiEmbedder::new(embedding, api_key)))
            }
        }
    }

    fn language_model(&self) -> Result<Arc<dyn LanguageModel>, RagError> {
        let llm = &self.settings.llm;
        let api_key = llm.api_key.clone().ok_or_else(|| {
            RagError::Configuration(
                "GROQ_API_KEY is not configured. Please set up your API key.".into(),
            )
        })?;
        Ok(Arc::new(OpenAiChatModel::new(llm, api_key)?))
    }
}
