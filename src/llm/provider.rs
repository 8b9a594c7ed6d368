use async_trait::async_trait;

use crate::core::errors::RagError;

/// Text-completion capability used to phrase grounded answers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// return the model name (e.g. "llama-3.1-8b-instant")
    fn name(&self) -> &str;

    /// single non-streaming completion for a fully rendered prompt
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Maps text to fixed-length vectors. Identical input must yield identical
/// output, and vectors from different `model_id`s are not comparable.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// identifier persisted alongside every index built with this provider
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::ProviderFailure("embedding provider returned no vector".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}
