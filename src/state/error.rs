use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to open index store: {0}")]
    IndexStore(#[source] anyhow::Error),

    #[error("Failed to initialize text source: {0}")]
    Source(#[source] anyhow::Error),

    #[error("Failed to initialize retrieval context: {0}")]
    Rag(#[source] anyhow::Error),
}
