//! SQLite-backed index persistence.
//!
//! Chunks live in `topic_chunks`, namespaced by `topic_key`; the `topics`
//! table records build metadata and doubles as the existence check.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::index::{Chunk, TopicIndex};
use super::store::{IndexPersistence, PersistedTopic};
use super::topic::TopicKey;
use crate::core::config::AppPaths;
use crate::core::errors::RagError;

pub struct SqliteIndexStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteIndexStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, RagError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, RagError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(RagError::storage)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::storage)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), RagError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS topics (
                topic_key TEXT PRIMARY KEY,
                embedding_model TEXT NOT NULL,
                chunk_count INTEGER NOT NULL,
                source_text TEXT NOT NULL,
                built_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS topic_chunks (
                topic_key TEXT NOT NULL REFERENCES topics(topic_key) ON DELETE CASCADE,
                sequence_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (topic_key, sequence_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait]
impl IndexPersistence for SqliteIndexStore {
    async fn load(&self, topic_key: &TopicKey) -> Result<Option<TopicIndex>, RagError> {
        let Some(topic_row) = sqlx::query(
            "SELECT embedding_model, chunk_count, source_text, built_at
             FROM topics
             WHERE topic_key = ?1",
        )
        .bind(topic_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RagError::storage)?
        else {
            return Ok(None);
        };

        let chunk_count: i64 = topic_row.get("chunk_count");
        if chunk_count <= 0 {
            return Ok(None);
        }

        let built_at: String = topic_row.get("built_at");
        let built_at = DateTime::parse_from_rfc3339(&built_at)
            .map_err(RagError::storage)?
            .with_timezone(&Utc);

        let rows = sqlx::query(
            "SELECT sequence_id, content, embedding
             FROM topic_chunks
             WHERE topic_key = ?1
             ORDER BY sequence_id",
        )
        .bind(topic_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::storage)?;

        if rows.len() as i64 != chunk_count {
            tracing::warn!(
                topic_key = %topic_key,
                expected = chunk_count,
                found = rows.len(),
                "Persisted index is incomplete; ignoring it"
            );
            return Ok(None);
        }

        let entries = rows
            .iter()
            .map(|row| {
                let sequence_id: i64 = row.get("sequence_id");
                let embedding: Vec<u8> = row.get("embedding");
                (
                    Chunk {
                        text: row.get("content"),
                        sequence_id: sequence_id as usize,
                        topic_key: topic_key.clone(),
                    },
                    Self::deserialize_embedding(&embedding),
                )
            })
            .collect();

        Ok(Some(TopicIndex::restore(
            topic_key.clone(),
            topic_row.get("embedding_model"),
            topic_row.get("source_text"),
            built_at,
            entries,
        )))
    }

    async fn persist(&self, index: &TopicIndex) -> Result<(), RagError> {
        let topic_key = index.topic_key().as_str();
        let mut tx = self.pool.begin().await.map_err(RagError::storage)?;

        sqlx::query("DELETE FROM topic_chunks WHERE topic_key = ?1")
            .bind(topic_key)
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO topics
                (topic_key, embedding_model, chunk_count, source_text, built_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(topic_key)
        .bind(index.embedding_model())
        .bind(index.len() as i64)
        .bind(index.source_text())
        .bind(index.built_at().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(RagError::storage)?;

        for (chunk, embedding) in index.entries() {
            let blob = Self::serialize_embedding(embedding);
            sqlx::query(
                "INSERT INTO topic_chunks (topic_key, sequence_id, content, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(topic_key)
            .bind(chunk.sequence_id as i64)
            .bind(&chunk.text)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;
        }

        tx.commit().await.map_err(RagError::storage)?;
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<PersistedTopic>, RagError> {
        let rows = sqlx::query(
            "SELECT topic_key, chunk_count, embedding_model
             FROM topics
             ORDER BY topic_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(rows
            .iter()
            .map(|row| {
                let chunk_count: i64 = row.get("chunk_count");
                PersistedTopic {
                    topic_key: TopicKey::from_stored(row.get("topic_key")),
                    chunk_count: chunk_count as usize,
                    embedding_model: row.get("embedding_model"),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index(topic: &str, texts: &[&str]) -> TopicIndex {
        let key = TopicKey::normalize(topic).unwrap();
        let embeddings = texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![i as f32, 0.5, -1.25])
            .collect();
        TopicIndex::from_parts(
            key,
            "hashing-v1-3",
            &texts.join(" "),
            texts.iter().map(|t| t.to_string()).collect(),
            embeddings,
        )
    }

    #[tokio::test]
    async fn missing_topic_loads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteIndexStore::with_path(tmp.path().join("index.db"))
            .await
            .unwrap();

        let key = TopicKey::normalize("Nothing here").unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_then_load_round_trips_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("index.db");
        let index = sample_index("Rust", &["Rust is fast.", "Rust is safe.", "Cargo builds."]);

        {
            let store = SqliteIndexStore::with_path(db_path.clone()).await.unwrap();
            store.persist(&index).await.unwrap();
        }

        let reopened = SqliteIndexStore::with_path(db_path).await.unwrap();
        let loaded = reopened.load(index.topic_key()).await.unwrap().unwrap();

        assert_eq!(loaded.entries(), index.entries());
        assert_eq!(loaded.embedding_model(), "hashing-v1-3");
        assert_eq!(loaded.stats(), index.stats());
        assert_eq!(loaded.source_text(), "Rust is fast. Rust is safe. Cargo builds.");
        assert_eq!(loaded.built_at(), index.built_at());
    }

    #[tokio::test]
    async fn persist_replaces_previous_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteIndexStore::with_path(tmp.path().join("index.db"))
            .await
            .unwrap();

        store
            .persist(&sample_index("Rust", &["one", "two", "three"]))
            .await
            .unwrap();
        store.persist(&sample_index("Rust", &["only"])).await.unwrap();

        let key = TopicKey::normalize("Rust").unwrap();
        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].0.text, "only");
    }

    #[tokio::test]
    async fn topics_are_namespaced_and_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteIndexStore::with_path(tmp.path().join("index.db"))
            .await
            .unwrap();

        store.persist(&sample_index("Rust", &["a", "b"])).await.unwrap();
        store.persist(&sample_index("Go", &["c"])).await.unwrap();

        let rust = store
            .load(&TopicKey::normalize("rust").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(rust.chunks().all(|c| c.text == "a" || c.text == "b"));

        let listed: Vec<(String, usize)> = store
            .topics()
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.topic_key.to_string(), t.chunk_count))
            .collect();
        assert_eq!(listed, vec![("go".to_string(), 1), ("rust".to_string(), 2)]);
    }

    #[tokio::test]
    async fn empty_index_reads_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteIndexStore::with_path(tmp.path().join("index.db"))
            .await
            .unwrap();

        store.persist(&sample_index("Empty", &[])).await.unwrap();
        let key = TopicKey::normalize("Empty").unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }
}
