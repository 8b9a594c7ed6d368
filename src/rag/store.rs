//! IndexPersistence trait — durable storage for topic indexes.
//!
//! One namespace per topic key. An index is written and read as a unit;
//! the primary implementation is `SqliteIndexStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::Serialize;

use super::index::TopicIndex;
use super::topic::TopicKey;
use crate::core::errors::RagError;

/// Listing entry for a persisted topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedTopic {
    pub topic_key: TopicKey,
    pub chunk_count: usize,
    pub embedding_model: String,
}

#[async_trait]
pub trait IndexPersistence: Send + Sync {
    /// Load the persisted index for `topic_key`. `Ok(None)` means nothing
    /// (or an empty index) is stored under that key.
    async fn load(&self, topic_key: &TopicKey) -> Result<Option<TopicIndex>, RagError>;

    /// Store `index`, replacing anything previously stored under its key.
    /// All chunks are written atomically.
    async fn persist(&self, index: &TopicIndex) -> Result<(), RagError>;

    /// Every topic with a stored index, ordered by key.
    async fn topics(&self) -> Result<Vec<PersistedTopic>, RagError>;
}
