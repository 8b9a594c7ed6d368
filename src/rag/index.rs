use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::topic::TopicKey;

/// A bounded slice of source text; the retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub sequence_id: usize,
    pub topic_key: TopicKey,
}

/// An immutable snapshot of one topic: every chunk with its embedding, plus
/// the facts needed to decide whether the snapshot is still usable.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicIndex {
    topic_key: TopicKey,
    embedding_model: String,
    source_text: String,
    built_at: DateTime<Utc>,
    entries: Vec<(Chunk, Vec<f32>)>,
}

/// Summary reported by the index-only path, carrying the indexed source
/// text alongside its counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub topic_key: TopicKey,
    pub chunk_count: usize,
    pub total_characters: usize,
    pub word_count: usize,
    pub content: String,
}

impl TopicIndex {
    /// Assemble an index from chunk texts in sequence order and their
    /// embeddings (same length and order).
    pub fn from_parts(
        topic_key: TopicKey,
        embedding_model: impl Into<String>,
        source_text: &str,
        chunk_texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Self {
        debug_assert_eq!(chunk_texts.len(), embeddings.len());
        let entries = chunk_texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(sequence_id, (text, embedding))| {
                (
                    Chunk {
                        text,
                        sequence_id,
                        topic_key: topic_key.clone(),
                    },
                    embedding,
                )
            })
            .collect();

        Self {
            topic_key,
            embedding_model: embedding_model.into(),
            source_text: source_text.to_string(),
            built_at: Utc::now(),
            entries,
        }
    }

    /// Rebuild an index read back from durable storage.
    pub(crate) fn restore(
        topic_key: TopicKey,
        embedding_model: String,
        source_text: String,
        built_at: DateTime<Utc>,
        mut entries: Vec<(Chunk, Vec<f32>)>,
    ) -> Self {
        entries.sort_by_key(|(chunk, _)| chunk.sequence_id);
        Self {
            topic_key,
            embedding_model,
            source_text,
            built_at,
            entries,
        }
    }

    pub fn topic_key(&self) -> &TopicKey {
        &self.topic_key
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Chunk, Vec<f32>)] {
        &self.entries
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|(chunk, _)| chunk)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            topic_key: self.topic_key.clone(),
            chunk_count: self.entries.len(),
            total_characters: self.source_text.chars().count(),
            word_count: self.source_text.split_whitespace().count(),
            content: self.source_text.clone(),
        }
    }

    /// The cleaned text the chunks were cut from.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }
}
