use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::errors::ApiError;
use crate::rag::{Answer, SourceRef};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub topic: String,
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

pub async fn chat_info() -> impl IntoResponse {
    Json(json!({
        "message": "Chat endpoint is ready! Use POST method to ask questions about Wikipedia topics.",
        "usage": "Send a POST request with JSON body containing 'topic' and 'question' fields.",
        "example": {
            "method": "POST",
            "url": "/chat",
            "body": {
                "topic": "Artificial Intelligence",
                "question": "What is machine learning?"
            }
        }
    }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::BadRequest(
            "Topic parameter is required and cannot be empty".to_string(),
        ));
    }
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "Question parameter is required and cannot be empty".to_string(),
        ));
    }

    tracing::info!(topic, question_chars = question.len(), "Chat request");

    match state.orchestrator.ask(topic, question).await? {
        Answer::Grounded { text, sources } => {
            tracing::info!(topic, answer_chars = text.len(), "Generated answer");
            Ok(Json(ChatResponse {
                topic: topic.to_string(),
                question: question.to_string(),
                answer: text,
                sources,
            }))
        }
        failed @ Answer::Failed { .. } => Err(ApiError::BadGateway(failed.into_message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::ScriptedModel;
    use crate::server::handlers::test_support::{self, body_json};
    use axum::http::StatusCode;

    fn request(topic: &str, question: &str) -> Json<ChatRequest> {
        Json(ChatRequest {
            topic: topic.to_string(),
            question: question.to_string(),
        })
    }

    #[tokio::test]
    async fn chat_returns_grounded_answer() {
        let (state, _tmp) =
            test_support::state(Some(ScriptedModel::replying("Rust avoids a garbage collector.")));

        let Json(response) = chat(State(state), request("Rust", "How does Rust manage memory?"))
            .await
            .unwrap();

        assert_eq!(response.topic, "Rust");
        assert_eq!(response.question, "How does Rust manage memory?");
        assert_eq!(response.answer, "Rust avoids a garbage collector.");
        assert!(!response.sources.is_empty());
    }

    #[tokio::test]
    async fn blank_fields_are_bad_requests() {
        let (state, _tmp) = test_support::state(Some(ScriptedModel::replying("unused")));

        for (topic, question) in [("", "Why?"), ("Rust", "   ")] {
            let err = chat(State(state.clone()), request(topic, question))
                .await
                .unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn missing_credential_is_internal_error_naming_the_key() {
        let (state, _tmp) = test_support::state(None);

        let err = chat(State(state), request("Rust", "What is it?"))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway() {
        let (state, _tmp) = test_support::state(Some(ScriptedModel::failing("upstream timeout")));

        let err = chat(State(state), request("Rust", "What is it?"))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Error getting response:"));
    }

    #[tokio::test]
    async fn chat_info_describes_usage() {
        let body = body_json(chat_info().await.into_response()).await;
        assert_eq!(body["example"]["method"], "POST");
    }
}
