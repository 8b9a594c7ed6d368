use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the retrieval pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RagError {
    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),
    #[error("no content available for topic '{0}'")]
    ContentUnavailable(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("provider failure: {0}")]
    ProviderFailure(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl RagError {
    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        RagError::ProviderFailure(err.to_string())
    }

    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        RagError::Storage(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidTopic(_) => ApiError::BadRequest(err.to_string()),
            RagError::ContentUnavailable(topic) => ApiError::NotFound(format!(
                "Topic '{}' not found or no content available. Please check the spelling and try again.",
                topic
            )),
            RagError::Configuration(msg) => ApiError::Internal(msg),
            RagError::ProviderFailure(msg) => ApiError::BadGateway(msg),
            RagError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message, "detail": message }));
        (status, body).into_response()
    }
}
