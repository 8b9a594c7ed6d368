pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;
pub const TOP_K: usize = 3;

pub const LLM_BASE_URL: &str = "https://api.groq.com/openai";
pub const LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const LLM_TEMPERATURE: f64 = 0.7;
pub const LLM_TIMEOUT_SECS: u64 = 60;
pub const LLM_API_KEY_ENV: &str = "GROQ_API_KEY";

pub const EMBEDDING_DIMENSION: usize = 384;
pub const EMBEDDING_BATCH_SIZE: usize = 64;
pub const EMBEDDING_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const EMBEDDING_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub const SOURCE_BASE_URL: &str = "https://en.wikipedia.org/wiki";
pub const SOURCE_TIMEOUT_SECS: u64 = 30;
pub const SOURCE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 quickopedia/0.2";

pub const SERVER_HOST: &str = "0.0.0.0";
pub const SERVER_PORT: u16 = 8000;
