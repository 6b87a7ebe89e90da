use std::sync::Arc;
use mb_core::{ChatModel, EmbeddingModel, Error, Result};
use url::Url;
use crate::embeddings::OpenAiEmbeddingModel;
use crate::{Config, ModelKind};

pub mod deepseek;
pub mod dummy;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;

/// Resolves `path` below `base`, keeping every segment of the base path.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base).map_err(|e| Error::Config(format!("Invalid API base URL '{}': {}", base, e)))?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| Error::Config(format!("Invalid API path '{}': {}", path, e)))
}

pub fn create_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    match config.kind {
        ModelKind::DeepSeek => Ok(Arc::new(DeepSeekModel::new(config)?)),
        ModelKind::Dummy => Ok(Arc::new(DummyModel::new())),
    }
}

pub fn create_embedding_model(config: &Config) -> Result<Arc<dyn EmbeddingModel>> {
    match config.kind {
        ModelKind::DeepSeek => Ok(Arc::new(OpenAiEmbeddingModel::new(config)?)),
        ModelKind::Dummy => Ok(Arc::new(DummyModel::new())),
    }
}
