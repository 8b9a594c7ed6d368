//! Reference-text sources.

mod wikipedia;

use async_trait::async_trait;

use crate::core::errors::RagError;

pub use wikipedia::{clean_article_html, WikipediaSource};

/// Returns the raw reference text for a topic.
///
/// `Ok(None)` means the topic has no article; `Ok(Some(""))` means the
/// article exists but yielded no text. Both are treated as "no content" by
/// the index builder, but callers can tell them apart.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, topic: &str) -> Result<Option<String>, RagError>;
}
