use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use quickopedia::core;
use quickopedia::core::config::AppPaths;
use quickopedia::server;
use quickopedia::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    core::logging::init(&paths);
    let state = AppState::initialize(paths).await?;

    let redacted = state
        .config
        .redact_sensitive_values(&serde_json::to_value(state.settings.as_ref())?);
    tracing::debug!(settings = %redacted, "Loaded settings");

    if !state.orchestrator.llm_configured().await {
        tracing::warn!("GROQ_API_KEY is not configured; /chat will be unavailable");
    }

    for topic in state.settings.rag.preload_topics.clone() {
        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.preload(&topic).await;
        });
    }

    let bind_addr = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("QUICKOPEDIA_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
