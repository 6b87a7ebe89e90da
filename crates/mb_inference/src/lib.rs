use std::str::FromStr;
use mb_core::{Error, Result};

pub mod embeddings;
pub mod health;
pub mod models;
pub mod pacing;

pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.together.xyz/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    DeepSeek,
    Dummy,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Config(format!(
                "Unknown model '{}'. Available models: deepseek, dummy",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub kind: ModelKind,
    pub chat_api_key: Option<String>,
    pub chat_base_url: String,
    pub chat_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_base_url: String,
    pub embedding_model: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("kind", &self.kind)
            .field("chat_api_key", &self.chat_api_key.as_deref().map(|_| "<redacted>"))
            .field("chat_base_url", &self.chat_base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_api_key", &self.embedding_api_key.as_deref().map(|_| "<redacted>"))
            .field("embedding_base_url", &self.embedding_base_url)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: ModelKind::DeepSeek,
            chat_api_key: None,
            chat_base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            chat_model: "deepseek-chat".to_string(),
            embedding_api_key: None,
            embedding_base_url: DEFAULT_EMBEDDING_BASE_URL.to_string(),
            embedding_model: "togethercomputer/m2-bert-80M-32k-retrieval".to_string(),
        }
    }
}

impl Config {
    /// Fills the API keys from `DEEPSEEK_API_KEY` and `EMBEDDING_API_KEY`.
    pub fn with_env_keys(mut self) -> Self {
        self.chat_api_key = self.chat_api_key.or_else(|| std::env::var("DEEPSEEK_API_KEY").ok());
        self.embedding_api_key = self
            .embedding_api_key
            .or_else(|| std::env::var("EMBEDDING_API_KEY").ok());
        self
    }
}

pub mod prelude {
    pub use super::{Config, ModelKind};
    pub use super::models::{create_chat_model, create_embedding_model};
    pub use super::pacing::PacedChatModel;
    pub use mb_core::{ChatModel, EmbeddingModel, Error, Result};
}

pub use models::{create_chat_model, create_embedding_model};
