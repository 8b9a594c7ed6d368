use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::errors::ApiError;
use crate::rag::TopicKey;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub topic: String,
    pub topic_key: TopicKey,
    pub chunk_count: usize,
    pub content: String,
    pub content_length: usize,
    pub word_count: usize,
}

/// Fetch, chunk, embed and store a topic without involving the language
/// model.
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::BadRequest(
            "Topic parameter is required and cannot be empty".to_string(),
        ));
    }

    tracing::info!(topic, "Scrape request");
    let stats = state.orchestrator.build_index_only(topic).await?;

    Ok(Json(ScrapeResponse {
        topic: topic.to_string(),
        topic_key: stats.topic_key,
        chunk_count: stats.chunk_count,
        content: stats.content,
        content_length: stats.total_characters,
        word_count: stats.word_count,
    }))
}

pub async fn list_topics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let topics = state.orchestrator.topics().await?;
    Ok(Json(json!({ "topics": topics })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handlers::test_support::{self, body_json, ARTICLE};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn scrape_returns_content_and_index_stats() {
        let (state, _tmp) = test_support::state(None);

        let Json(response) = scrape(
            State(state.clone()),
            Json(ScrapeRequest {
                topic: "  Rust ".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.topic, "Rust");
        assert_eq!(response.topic_key.as_str(), "rust");
        assert!(response.chunk_count >= 2);
        assert_eq!(response.content, ARTICLE);
        assert_eq!(response.content_length, ARTICLE.chars().count());
        assert_eq!(response.word_count, ARTICLE.split_whitespace().count());

        let body = body_json(list_topics(State(state)).await.unwrap().into_response()).await;
        assert_eq!(body["topics"][0]["topic_key"], "rust");
    }

    #[tokio::test]
    async fn blank_topic_is_a_bad_request() {
        let (state, _tmp) = test_support::state(None);
        let err = scrape(State(state), Json(ScrapeRequest { topic: " ".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_topic_is_not_found() {
        let (state, _tmp) = test_support::state(None);
        let err = scrape(
            State(state),
            Json(ScrapeRequest {
                topic: "Atlantis".into(),
            }),
        )
        .await
        .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("Atlantis"));
    }
}
