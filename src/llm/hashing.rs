//! Local feature-hashing embedder.
//!
//! Lowercased word unigrams and bigrams are hashed with SHA-256 into a fixed
//! number of signed buckets and the result is L2-normalized. Needs no
//! network or credential, and the output is stable across processes, so
//! persisted indexes stay comparable after a restart.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::provider::EmbeddingProvider;
use crate::core::errors::RagError;

const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-v1-{}", dimension),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        embed_with_dimension(text, self.dimension)
    }
}

fn embed_with_dimension(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect();

    for token in &tokens {
        accumulate(&mut vector, token.as_bytes(), 1.0);
    }
    for pair in tokens.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    vector
}

fn accumulate(vector: &mut [f32], feature: &[u8], weight: f32) {
    let digest = Sha256::digest(feature);
    let mut bucket_bytes = [0u8; 8];
    bucket_bytes.copy_from_slice(&digest[..8]);
    let bucket = (u64::from_le_bytes(bucket_bytes) % vector.len() as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    vector[bucket] += sign * weight;
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let texts = texts.to_vec();
        let dimension = self.dimension;
        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| embed_with_dimension(text, dimension))
                .collect()
        })
        .await
        .map_err(RagError::provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_math::cosine_similarity;

    #[test]
    fn identical_text_yields_identical_vectors() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_text("Rust is a systems programming language");
        let b = embedder.embed_text("Rust is a systems programming language");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn vectors_are_unit_length() {
        let embedder = HashingEmbedder::new(128);
        let v = embedder.embed_text("The quick brown fox jumps over the lazy dog");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_text("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn related_text_scores_higher_than_unrelated() {
        let embedder = HashingEmbedder::new(384);
        let query = embedder.embed_text("who designed the python language");
        let related = embedder.embed_text("Python is a language designed by Guido van Rossum");
        let unrelated = embedder.embed_text("Photosynthesis converts light into chemical energy");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn batch_matches_single_embeddings() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["alpha beta".to_string(), "gamma delta".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("alpha beta").await.unwrap());
        assert_eq!(batch[1], embedder.embed("gamma delta").await.unwrap());
        assert_eq!(embedder.model_id(), "hashing-v1-32");
    }
}
