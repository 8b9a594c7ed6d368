//! Process-wide retrieval state.
//!
//! Everything here is populated on first use and lives as long as the
//! process: the provider handles, the per-topic index cache and the
//! per-topic pipeline cache. Nothing is torn down explicitly.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::chunker::TextSplitter;
use super::composer::{AnswerComposer, Pipeline, PromptTemplate};
use super::index_store::IndexStore;
use super::retriever::Retriever;
use super::single_flight::SingleFlight;
use super::store::IndexPersistence;
use super::topic::TopicKey;
use crate::core::config::RagSettings;
use crate::core::errors::RagError;
use crate::llm::{EmbeddingProvider, LanguageModel, ProviderFactory};
use crate::source::TextSource;

pub struct RagContext {
    pub(crate) source: Arc<dyn TextSource>,
    factory: Arc<dyn ProviderFactory>,
    top_k: usize,
    template: PromptTemplate,
    embedder: OnceCell<Arc<dyn EmbeddingProvider>>,
    model: OnceCell<Arc<dyn LanguageModel>>,
    composer: OnceCell<AnswerComposer>,
    pub(crate) indexes: IndexStore,
    pub(crate) pipelines: SingleFlight<TopicKey, Arc<Pipeline>>,
}

impl RagContext {
    pub fn new(
        settings: &RagSettings,
        source: Arc<dyn TextSource>,
        factory: Arc<dyn ProviderFactory>,
        persistence: Arc<dyn IndexPersistence>,
    ) -> Result<Self, RagError> {
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap)?;
        let template = match &settings.prompt_template {
            Some(template) => PromptTemplate::new(template.as_str())?,
            None => PromptTemplate::default(),
        };
        Ok(Self {
            source,
            factory,
            top_k: settings.top_k,
            template,
            embedder: OnceCell::new(),
            model: OnceCell::new(),
            composer: OnceCell::new(),
            indexes: IndexStore::new(persistence, splitter),
            pipelines: SingleFlight::new(),
        })
    }

    pub async fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
        self.embedder
            .get_or_try_init(|| async {
                let embedder = self.factory.embedding_provider()?;
                tracing::info!(model = embedder.model_id(), "Embedding provider ready");
                Ok::<_, RagError>(embedder)
            })
            .await
            .cloned()
    }

    /// Language model handle; a missing credential surfaces here, on first
    /// use, and is retried on the next call.
    pub async fn language_model(&self) -> Result<Arc<dyn LanguageModel>, RagError> {
        self.model
            .get_or_try_init(|| async {
                let model = self.factory.language_model()?;
                tracing::info!(model = model.name(), "Language model client ready");
                Ok::<_, RagError>(model)
            })
            .await
            .cloned()
    }

    pub async fn composer(&self) -> Result<&AnswerComposer, RagError> {
        self.composer
            .get_or_try_init(|| async {
                let model = self.language_model().await?;
                let embedder = self.embedder().await?;
                Ok::<_, RagError>(AnswerComposer::new(
                    model,
                    Retriever::new(embedder, self.top_k),
                    self.template.clone(),
                ))
            })
            .await
    }
}
