use std::sync::Arc;

use serde::Serialize;

use super::index::{Chunk, TopicIndex};
use crate::core::errors::RagError;
use crate::llm::EmbeddingProvider;
use crate::vector_math::rank_descending_by_cosine;

pub const DEFAULT_TOP_K: usize = 3;

/// A retrieved chunk with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-k similarity search over one topic index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            embedder,
            top_k: top_k.max(1),
        }
    }

    /// Retrieve with the configured `k`.
    pub async fn retrieve(
        &self,
        index: &TopicIndex,
        query: &str,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        self.top_k(index, query, self.top_k).await
    }

    /// The `k` chunks most similar to `query`, best first; ties go to the
    /// lower sequence id. Returns fewer than `k` only when the index is
    /// smaller, and nothing only when it is empty.
    pub async fn top_k(
        &self,
        index: &TopicIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if index.embedding_model() != self.embedder.model_id() {
            return Err(RagError::ProviderFailure(format!(
                "index for '{}' was built with embedding model '{}' but the active model is '{}'",
                index.topic_key(),
                index.embedding_model(),
                self.embedder.model_id()
            )));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let candidates = index
            .entries()
            .iter()
            .map(|(_, embedding)| embedding.as_slice());

        // entries are in sequence order, so index order breaks ties
        Ok(rank_descending_by_cosine(&query_embedding, candidates)
            .into_iter()
            .take(k)
            .map(|(idx, score)| RetrievedChunk {
                chunk: index.entries()[idx].0.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HashingEmbedder;
    use crate::rag::topic::TopicKey;

    async fn build_index(embedder: &HashingEmbedder, texts: &[&str]) -> TopicIndex {
        let chunk_texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = embedder.embed_batch(&chunk_texts).await.unwrap();
        TopicIndex::from_parts(
            TopicKey::normalize("Solar system").unwrap(),
            embedder.model_id(),
            &texts.join("\n"),
            chunk_texts,
            embeddings,
        )
    }

    #[tokio::test]
    async fn near_duplicate_chunk_ranks_first() {
        let embedder = HashingEmbedder::new(256);
        let index = build_index(
            &embedder,
            &[
                "The Sun is a G-type main-sequence star.",
                "Mercury is the smallest planet and closest to the Sun.",
                "Jupiter is the largest planet with a Great Red Spot storm.",
                "Saturn is known for its prominent ring system.",
                "Neptune is the farthest known planet from the Sun.",
            ],
        )
        .await;
        let retriever = Retriever::new(Arc::new(embedder), DEFAULT_TOP_K);

        let hits = retriever
            .top_k(&index, "Jupiter is the largest planet with a Great Red Spot", 1)
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.sequence_id, 2);
    }

    #[tokio::test]
    async fn returns_all_chunks_when_index_is_small() {
        let embedder = HashingEmbedder::new(64);
        let index = build_index(&embedder, &["alpha", "beta"]).await;
        let retriever = Retriever::new(Arc::new(embedder), DEFAULT_TOP_K);

        let hits = retriever.retrieve(&index, "gamma").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn ties_prefer_earlier_chunks() {
        let embedder = HashingEmbedder::new(64);
        let index = build_index(&embedder, &["same words", "other text", "same words"]).await;
        let retriever = Retriever::new(Arc::new(embedder), DEFAULT_TOP_K);

        let hits = retriever.top_k(&index, "same words", 2).await.unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.chunk.sequence_id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let embedder = HashingEmbedder::new(16);
        let index = build_index(&embedder, &[]).await;
        let retriever = Retriever::new(Arc::new(embedder), DEFAULT_TOP_K);

        assert!(retriever.retrieve(&index, "anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_embedding_model_is_rejected() {
        let index = build_index(&HashingEmbedder::new(32), &["alpha"]).await;
        let retriever = Retriever::new(Arc::new(HashingEmbedder::new(64)), DEFAULT_TOP_K);

        let err = retriever.retrieve(&index, "alpha").await.unwrap_err();
        assert!(matches!(err, RagError::ProviderFailure(_)));
    }
}
