//! Per-topic index cache.
//!
//! Lookup order: in-memory, then durable storage, then a fresh build from
//! the text source. At most one build per topic key runs at a time; every
//! concurrent caller for that key receives the same `Arc<TopicIndex>`.

use std::sync::Arc;

use super::chunker::TextSplitter;
use super::index::TopicIndex;
use super::single_flight::SingleFlight;
use super::store::{IndexPersistence, PersistedTopic};
use super::topic::{Topic, TopicKey};
use crate::core::errors::RagError;
use crate::llm::EmbeddingProvider;
use crate::source::TextSource;

pub struct IndexStore {
    persistence: Arc<dyn IndexPersistence>,
    splitter: TextSplitter,
    cache: SingleFlight<TopicKey, Arc<TopicIndex>>,
}

impl IndexStore {
    pub fn new(persistence: Arc<dyn IndexPersistence>, splitter: TextSplitter) -> Self {
        Self {
            persistence,
            splitter,
            cache: SingleFlight::new(),
        }
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.len().await
    }

    pub async fn persisted_topics(&self) -> Result<Vec<PersistedTopic>, RagError> {
        self.persistence.topics().await
    }

    pub async fn get_or_build(
        &self,
        topic: &Topic,
        source: &dyn TextSource,
        embedder: &Arc<dyn EmbeddingProvider>,
    ) -> Result<Arc<TopicIndex>, RagError> {
        self.cache
            .get_or_try_init(topic.key(), || async {
                self.load_or_build(topic, source, embedder.as_ref())
                    .await
                    .map(Arc::new)
            })
            .await
    }

    async fn load_or_build(
        &self,
        topic: &Topic,
        source: &dyn TextSource,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<TopicIndex, RagError> {
        let key = topic.key();

        if let Some(stored) = self.persistence.load(key).await? {
            if stored.embedding_model() == embedder.model_id() {
                tracing::info!(
                    topic_key = %key,
                    chunks = stored.len(),
                    "Loaded persisted index"
                );
                return Ok(stored);
            }
            tracing::info!(
                topic_key = %key,
                stored_model = stored.embedding_model(),
                active_model = embedder.model_id(),
                "Persisted index uses a different embedding model; rebuilding"
            );
        }

        self.build(topic, source, embedder).await
    }

    async fn build(
        &self,
        topic: &Topic,
        source: &dyn TextSource,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<TopicIndex, RagError> {
        let key = topic.key();
        tracing::info!(topic = topic.name(), topic_key = %key, "Building index");

        let text = match source.fetch(topic.name()).await? {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(RagError::ContentUnavailable(topic.name().to_string())),
        };

        let chunk_texts = self.splitter.split(&text);
        if chunk_texts.is_empty() {
            return Err(RagError::ContentUnavailable(topic.name().to_string()));
        }

        let embeddings = embedder.embed_batch(&chunk_texts).await?;
        if embeddings.len() != chunk_texts.len() {
            return Err(RagError::ProviderFailure(format!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunk_texts.len()
            )));
        }

        let index = TopicIndex::from_parts(
            key.clone(),
            embedder.model_id(),
            &text,
            chunk_texts,
            embeddings,
        );
        self.persistence.persist(&index).await?;

        tracing::info!(
            topic_key = %key,
            chunks = index.len(),
            characters = index.stats().total_characters,
            "Index built and persisted"
        );
        Ok(index)
    }
}
