//! Typed view over the merged YAML configuration.
//!
//! Every field has a default, so an empty config yields a working
//! local-only setup (hashing embedder, no language model credential).

use std::env;

use serde::Serialize;
use serde_json::Value;

use super::defaults;

#[derive(Debug, Clone, Serialize)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub preload_topics: Vec<String>,
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    Hashing,
    OpenAi,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub batch_size: usize,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub rag: RagSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub source: SourceSettings,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config_with_env(&Value::Null, |_| None)
    }
}

impl Settings {
    /// Build settings from config, letting process environment override
    /// credentials and the listen port.
    pub fn from_config(config: &Value) -> Self {
        Self::from_config_with_env(config, |key| env::var(key).ok())
    }

    pub fn from_config_with_env<F>(config: &Value, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let rag_cfg = config.get("rag");
        let chunk_size = get_u64(rag_cfg, "chunk_size")
            .map(|v| v as usize)
            .unwrap_or(defaults::CHUNK_SIZE)
            .max(1);
        let chunk_overlap = get_u64(rag_cfg, "chunk_overlap")
            .map(|v| v as usize)
            .unwrap_or(defaults::CHUNK_OVERLAP)
            .min(chunk_size.saturating_sub(1));
        let top_k = get_u64(rag_cfg, "top_k")
            .map(|v| v as usize)
            .unwrap_or(defaults::TOP_K)
            .clamp(1, 50);
        let preload_topics = rag_cfg
            .and_then(|v| v.get("preload_topics"))
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let prompt_template =
            get_str(rag_cfg, "prompt_template").filter(|template| !template.trim().is_empty());

        let llm_cfg = config.get("llm");
        let llm_api_key = env_lookup(defaults::LLM_API_KEY_ENV)
            .or_else(|| get_str(llm_cfg, "api_key"))
            .filter(|key| !key.trim().is_empty());
        let llm = LlmSettings {
            base_url: get_str(llm_cfg, "base_url")
                .unwrap_or_else(|| defaults::LLM_BASE_URL.to_string()),
            model: get_str(llm_cfg, "model").unwrap_or_else(|| defaults::LLM_MODEL.to_string()),
            temperature: llm_cfg
                .and_then(|v| v.get("temperature"))
                .and_then(|v| v.as_f64())
                .unwrap_or(defaults::LLM_TEMPERATURE)
                .clamp(0.0, 2.0),
            max_tokens: get_u64(llm_cfg, "max_tokens").map(|v| v.min(u32::MAX as u64) as u32),
            timeout_secs: get_u64(llm_cfg, "timeout_secs").unwrap_or(defaults::LLM_TIMEOUT_SECS),
            api_key: llm_api_key,
        };

        let embedding_cfg = config.get("embedding");
        let backend = match get_str(embedding_cfg, "provider").as_deref() {
            Some("openai") => EmbeddingBackend::OpenAi,
            _ => EmbeddingBackend::Hashing,
        };
        let embedding = EmbeddingSettings {
            backend,
            dimension: get_u64(embedding_cfg, "dimension")
                .map(|v| v as usize)
                .unwrap_or(defaults::EMBEDDING_DIMENSION)
                .max(1),
            batch_size: get_u64(embedding_cfg, "batch_size")
                .map(|v| v as usize)
                .unwrap_or(defaults::EMBEDDING_BATCH_SIZE)
                .max(1),
            model: get_str(embedding_cfg, "model")
                .unwrap_or_else(|| defaults::EMBEDDING_OPENAI_MODEL.to_string()),
            base_url: get_str(embedding_cfg, "base_url")
                .unwrap_or_else(|| defaults::EMBEDDING_OPENAI_BASE_URL.to_string()),
            api_key: get_str(embedding_cfg, "api_key").filter(|key| !key.trim().is_empty()),
        };

        let source_cfg = config.get("source");
        let source = SourceSettings {
            base_url: get_str(source_cfg, "base_url")
                .unwrap_or_else(|| defaults::SOURCE_BASE_URL.to_string()),
            timeout_secs: get_u64(source_cfg, "timeout_secs")
                .unwrap_or(defaults::SOURCE_TIMEOUT_SECS),
            user_agent: get_str(source_cfg, "user_agent")
                .unwrap_or_else(|| defaults::SOURCE_USER_AGENT.to_string()),
        };

        let server_cfg = config.get("server");
        let port = env_lookup("PORT")
            .and_then(|val| val.parse::<u16>().ok())
            .or_else(|| get_u64(server_cfg, "port").and_then(|v| u16::try_from(v).ok()))
            .unwrap_or(defaults::SERVER_PORT);
        let server = ServerSettings {
            host: get_str(server_cfg, "host").unwrap_or_else(|| defaults::SERVER_HOST.to_string()),
            port,
        };

        Settings {
            rag: RagSettings {
                chunk_size,
                chunk_overlap,
                top_k,
                preload_topics,
                prompt_template,
            },
            llm,
            embedding,
            source,
            server,
        }
    }
}

fn get_u64(section: Option<&Value>, key: &str) -> Option<u64> {
    section.and_then(|v| v.get(key)).and_then(|v| v.as_u64())
}

fn get_str(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
