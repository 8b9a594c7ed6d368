use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the Quick o Pedia API!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scrape": "/scrape - Index a Wikipedia article for a topic",
            "chat": "/chat - Ask questions about an indexed topic (GET for info, POST for chat)",
            "topics": "/topics - List topics with a stored index",
            "health": "/health - Check API health"
        }
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let configured = state.orchestrator.llm_configured().await;
    let (status, message) = if configured {
        ("healthy", "API is running")
    } else {
        ("warning", "API is running but GROQ_API_KEY is not configured")
    };

    Json(json!({
        "status": status,
        "message": message,
        "groq_api_configured": configured
    }))
}
