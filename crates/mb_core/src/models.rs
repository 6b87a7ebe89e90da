use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    /// Single-turn completion. Callers treat an error and an empty reply alike.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;

    /// Generate embeddings for a piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
