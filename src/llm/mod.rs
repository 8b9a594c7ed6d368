pub mod factory;
pub mod hashing;
pub mod openai;
pub mod provider;
pub mod types;

pub use factory::{ProviderFactory, SettingsProviderFactory};
pub use hashing::HashingEmbedder;
pub use openai::{OpenAiChatModel, OpenAiEmbedder};
pub use provider::{EmbeddingProvider, LanguageModel};
pub use types::{ChatMessage, ChatRequest};
