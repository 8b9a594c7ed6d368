use std::sync::Arc;

use super::composer::{Answer, Pipeline};
use super::context::RagContext;
use super::index::IndexStats;
use super::store::PersistedTopic;
use super::topic::Topic;
use crate::core::errors::RagError;

/// Entry point tying source, index cache, retriever and composer together.
#[derive(Clone)]
pub struct Orchestrator {
    context: Arc<RagContext>,
}

impl Orchestrator {
    pub fn new(context: RagContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &RagContext {
        &self.context
    }

    /// Answer `question` from the reference text for `topic`.
    ///
    /// The language model is resolved before anything is fetched, so a
    /// missing credential fails fast with `RagError::Configuration`.
    /// Upstream failures while answering come back as `Answer::Failed`.
    pub async fn ask(&self, topic: &str, question: &str) -> Result<Answer, RagError> {
        let pipeline = self.pipeline(topic).await?;
        let composer = self.context.composer().await?;
        Ok(composer.answer(&pipeline, question).await)
    }

    /// Cached pipeline for `topic`, building the index and pipeline on
    /// first use. One build per topic key, however many callers race.
    pub async fn pipeline(&self, topic: &str) -> Result<Arc<Pipeline>, RagError> {
        let topic = Topic::parse(topic)?;
        let composer = self.context.composer().await?;

        self.context
            .pipelines
            .get_or_try_init(topic.key(), || async {
                let embedder = self.context.embedder().await?;
                let index = self
                    .context
                    .indexes
                    .get_or_build(&topic, self.context.source.as_ref(), &embedder)
                    .await?;
                tracing::info!(topic_key = %topic.key(), chunks = index.len(), "Pipeline ready");
                Ok::<_, RagError>(Arc::new(composer.build_pipeline(topic.key().clone(), index)))
            })
            .await
    }

    /// Build (or load) the index for `topic` without the language model.
    pub async fn build_index_only(&self, topic: &str) -> Result<IndexStats, RagError> {
        let topic = Topic::parse(topic)?;
        let embedder = self.context.embedder().await?;
        let index = self
            .context
            .indexes
            .get_or_build(&topic, self.context.source.as_ref(), &embedder)
            .await?;
        Ok(index.stats())
    }

    /// Warm the caches for `topic`. Builds the full pipeline when a
    /// language model is available, otherwise just the index.
    pub async fn preload(&self, topic: &str) {
        let result = if self.llm_configured().await {
            self.pipeline(topic).await.map(|pipeline| pipeline.index().len())
        } else {
            self.build_index_only(topic).await.map(|stats| stats.chunk_count)
        };

        match result {
            Ok(chunks) => tracing::info!(topic, chunks, "Preloaded topic"),
            Err(err) => tracing::warn!(topic, error = %err, "Failed to preload topic"),
        }
    }

    pub async fn llm_configured(&self) -> bool {
        self.context.language_model().await.is_ok()
    }

    pub async fn topics(&self) -> Result<Vec<PersistedTopic>, RagError> {
        self.context.indexes.persisted_topics().await
    }
}
