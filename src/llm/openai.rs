//! Clients for OpenAI-compatible HTTP APIs (Groq, OpenAI, LM Studio, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{EmbeddingProvider, LanguageModel};
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::{EmbeddingSettings, LlmSettings};
use crate::core::errors::RagError;

#[derive(Clone)]
pub struct OpenAiChatModel {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiChatModel {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client,
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temperature) = request.temperature {
                obj.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(max_tokens) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RagError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ProviderFailure(format!(
                "chat completion failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(RagError::provider)?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                RagError::ProviderFailure("chat completion response had no message content".into())
            })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        self.chat(request).await
    }
}

#[derive(Clone)]
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    batch_size: usize,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings, api_key: String) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            dimension: settings.dimension,
            batch_size: settings.batch_size.max(1),
            client: Client::new(),
        }
    }

    async fn embed_request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RagError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ProviderFailure(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(RagError::provider)?;
        parse_embeddings(&payload, inputs.len(), self.dimension)
    }
}

/// Read `data[*].embedding`, ordered by each item's `index` field. Every
/// vector must be all numbers and exactly `dimension` long.
fn parse_embeddings(
    payload: &Value,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| RagError::ProviderFailure("embedding response had no data".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
        let Some(vals) = item["embedding"].as_array() else {
            return Err(RagError::ProviderFailure(format!(
                "embedding response item {} had no vector",
                position
            )));
        };
        let vec = vals
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                RagError::ProviderFailure(format!(
                    "embedding response item {} had a non-numeric value",
                    position
                ))
            })?;
        if vec.len() != dimension {
            return Err(RagError::ProviderFailure(format!(
                "embedding response item {} has dimension {}, expected {}",
                position,
                vec.len(),
                dimension
            )));
        }
        indexed.push((index, vec));
    }
    indexed.sort_by_key(|(index, _)| *index);

    if indexed.len() != expected {
        return Err(RagError::ProviderFailure(format!(
            "expected {} embeddings, received {}",
            expected,
            indexed.len()
        )));
    }

    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_request(batch).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_embeddings_orders_by_index() {
        let payload = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });

        let vectors = parse_embeddings(&payload, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn parse_embeddings_rejects_count_mismatch() {
        let payload = json!({ "data": [ { "index": 0, "embedding": [1.0] } ] });
        let err = parse_embeddings(&payload, 3, 1).unwrap_err();
        assert!(matches!(err, RagError::ProviderFailure(_)));
    }

    #[test]
    fn parse_embeddings_rejects_wrong_dimension() {
        let payload = json!({ "data": [ { "index": 0, "embedding": [1.0, 0.0, 0.5] } ] });
        let err = parse_embeddings(&payload, 1, 4).unwrap_err();
        assert_eq!(
            err,
            RagError::ProviderFailure("embedding response item 0 has dimension 3, expected 4".into())
        );
    }

    #[test]
    fn parse_embeddings_rejects_non_numeric_values() {
        let payload = json!({ "data": [ { "index": 0, "embedding": [1.0, "x", 0.5] } ] });
        let err = parse_embeddings(&payload, 1, 3).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn chat_model_reports_configured_name() {
        let settings = crate::core::config::Settings::default().llm;
        let model = OpenAiChatModel::new(&settings, "key".into()).unwrap();
        assert_eq!(model.name(), "llama-3.1-8b-instant");
    }
}
