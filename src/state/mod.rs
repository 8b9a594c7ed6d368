use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::llm::SettingsProviderFactory;
use crate::rag::{Orchestrator, RagContext, SqliteIndexStore};
use crate::source::WikipediaSource;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes and startup tasks.
///
/// Provider handles and topic caches live inside the orchestrator's
/// `RagContext` and are populated on first use.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<Settings>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Resolve paths and load configuration (config.yml + secrets.yaml)
    /// 2. Open the on-disk index store
    /// 3. Wire the Wikipedia source and provider factory into the orchestrator
    ///
    /// No provider is contacted here; a missing LLM credential only
    /// surfaces when a question is asked.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let settings = Settings::from_config(&raw);

        let persistence = SqliteIndexStore::new(paths.as_ref())
            .await
            .map_err(|e| InitializationError::IndexStore(e.into()))?;
        tracing::info!(path = %persistence.db_path().display(), "Index store opened");

        let source = WikipediaSource::new(&settings.source)
            .map_err(|e| InitializationError::Source(e.into()))?;
        let factory = SettingsProviderFactory::new(settings.clone());

        let context = RagContext::new(
            &settings.rag,
            Arc::new(source),
            Arc::new(factory),
            Arc::new(persistence),
        )
        .map_err(|e| InitializationError::Rag(e.into()))?;

        Ok(Arc::new(Self::from_parts(
            paths,
            config,
            settings,
            Orchestrator::new(context),
        )))
    }

    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            paths,
            config,
            settings: Arc::new(settings),
            orchestrator,
        }
    }
}
