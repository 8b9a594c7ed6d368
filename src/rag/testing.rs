//! In-process fakes shared by the rag tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::index::TopicIndex;
use super::store::{IndexPersistence, PersistedTopic};
use super::topic::TopicKey;
use crate::core::errors::RagError;
use crate::llm::{EmbeddingProvider, HashingEmbedder, LanguageModel, ProviderFactory};
use crate::source::TextSource;

/// Serves canned articles by exact title and records every title it was
/// asked for.
#[derive(Default)]
pub struct CountingSource {
    articles: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl CountingSource {
    pub fn with_article(topic: &str, text: &str) -> Self {
        Self::default().and_article(topic, text)
    }

    pub fn and_article(mut self, title: &str, text: &str) -> Self {
        self.articles.insert(title.to_string(), text.to_string());
        self
    }

    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn fetches(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextSource for CountingSource {
    async fn fetch(&self, topic: &str) -> Result<Option<String>, RagError> {
        self.requested.lock().unwrap().push(topic.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.articles.get(topic).cloned())
    }
}

#[derive(Default)]
pub struct MemoryPersistence {
    indexes: Mutex<HashMap<TopicKey, TopicIndex>>,
}

#[async_trait]
impl IndexPersistence for MemoryPersistence {
    async fn load(&self, topic_key: &TopicKey) -> Result<Option<TopicIndex>, RagError> {
        let indexes = self.indexes.lock().unwrap();
        Ok(indexes.get(topic_key).filter(|index| !index.is_empty()).cloned())
    }

    async fn persist(&self, index: &TopicIndex) -> Result<(), RagError> {
        let mut indexes = self.indexes.lock().unwrap();
        indexes.insert(index.topic_key().clone(), index.clone());
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<PersistedTopic>, RagError> {
        let indexes = self.indexes.lock().unwrap();
        let mut topics: Vec<PersistedTopic> = indexes
            .values()
            .map(|index| PersistedTopic {
                topic_key: index.topic_key().clone(),
                chunk_count: index.len(),
                embedding_model: index.embedding_model().to_string(),
            })
            .collect();
        topics.sort_by(|a, b| a.topic_key.cmp(&b.topic_key));
        Ok(topics)
    }
}

/// Language model returning a fixed reply (or a fixed failure) and
/// recording every prompt it was given.
pub struct ScriptedModel {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            reply: Err(cause.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(RagError::ProviderFailure)
    }
}

/// Factory handing out a hashing embedder and an optional scripted model;
/// `None` stands in for a missing credential.
pub struct FakeFactory {
    embedder: Arc<HashingEmbedder>,
    model: Option<Arc<ScriptedModel>>,
    embedder_builds: AtomicUsize,
    model_builds: AtomicUsize,
}

impl FakeFactory {
    pub fn new(model: Option<Arc<ScriptedModel>>) -> Self {
        Self {
            embedder: Arc::new(HashingEmbedder::new(256)),
            model,
            embedder_builds: AtomicUsize::new(0),
            model_builds: AtomicUsize::new(0),
        }
    }

    pub fn embedder_builds(&self) -> usize {
        self.embedder_builds.load(Ordering::SeqCst)
    }

    pub fn model_builds(&self) -> usize {
        self.model_builds.load(Ordering::SeqCst)
    }
}

impl ProviderFactory for FakeFactory {
    fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
        self.embedder_builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.embedder.clone())
    }

    fn language_model(&self) -> Result<Arc<dyn LanguageModel>, RagError> {
        self.model_builds.fetch_add(1, Ordering::SeqCst);
        match &self.model {
            Some(model) => Ok(model.clone()),
            None => Err(RagError::Configuration(
                "GROQ_API_KEY is not configured. Please set up your API key.".into(),
            )),
        }
    }
}
