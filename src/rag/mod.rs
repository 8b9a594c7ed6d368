//! Retrieval-augmented answering over per-topic reference text.
//!
//! - `TextSplitter`: recursive, overlap-preserving chunking
//! - `IndexStore`: per-topic index cache backed by `IndexPersistence`
//! - `Retriever`: cosine top-k over one topic index
//! - `AnswerComposer`: prompt assembly and the grounded model call
//! - `Orchestrator`: the `ask` / `build_index_only` entry points

pub mod chunker;
pub mod composer;
pub mod context;
pub mod index;
pub mod index_store;
pub mod orchestrator;
pub mod retriever;
pub mod single_flight;
pub mod sqlite;
pub mod store;
pub mod topic;

#[cfg(test)]
pub(crate) mod testing;

pub use chunker::TextSplitter;
pub use composer::{Answer, AnswerComposer, Pipeline, PromptTemplate, SourceRef};
pub use context::RagContext;
pub use index::{Chunk, IndexStats, TopicIndex};
pub use index_store::IndexStore;
pub use orchestrator::Orchestrator;
pub use retriever::{RetrievedChunk, Retriever, DEFAULT_TOP_K};
pub use sqlite::SqliteIndexStore;
pub use store::{IndexPersistence, PersistedTopic};
pub use topic::{Topic, TopicKey};
