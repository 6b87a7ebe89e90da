use std::collections::HashMap;
use std::fmt;
use async_trait::async_trait;
use mb_core::{ChatModel, EmbeddingModel, Result};

pub const DUMMY_EMBEDDING_SIZE: usize = 768;

/// Offline stand-in for both model kinds, useful for dry runs.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        // Echo the bullet lines back, each cut to its first 20 words
        let lines: Vec<String> = prompt
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("- ") || line.starts_with("Analysis: "))
            .map(|line| line.split_whitespace().take(20).collect::<Vec<_>>().join(" "))
            .collect();

        if lines.is_empty() {
            Ok(prompt.split_whitespace().take(20).collect::<Vec<_>>().join(" "))
        } else {
            Ok(lines.join("\n"))
        }
    }
}

#[async_trait]
impl EmbeddingModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; DUMMY_EMBEDDING_SIZE];
        if text.is_empty() {
            return Ok(embedding);
        }

        let text_len = text.len() as f32;
        embedding[0] = text_len / 1000.0;

        let mut char_freq: HashMap<char, usize> = HashMap::new();
        for c in text.chars() {
            *char_freq.entry(c).or_insert(0) += 1;
        }

        // Bucket by code point so the same text always maps to the same vector
        for (c, count) in char_freq {
            let slot = 1 + (c as usize) % (DUMMY_EMBEDDING_SIZE - 1);
            embedding[slot] += count as f32 / text_len;
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_chat_echoes_bullets() {
        let model = DummyModel::new();
        let reply = model
            .complete("Summaries:\n\n- Chip exports are restricted.\n\n- New GPU launched.\nWhat happened?")
            .await
            .unwrap();
        assert_eq!(reply, "- Chip exports are restricted.\n- New GPU launched.");

        let reply = model.complete("Respond with OK if you can read this.").await.unwrap();
        assert_eq!(reply, "Respond with OK if you can read this.");
    }

    #[tokio::test]
    async fn test_dummy_embedding_is_deterministic() {
        let model = DummyModel::new();
        let a = model.embed("Test text").await.unwrap();
        let b = model.embed("Test text").await.unwrap();
        assert_eq!(a.len(), DUMMY_EMBEDDING_SIZE);
        assert!(a[0] > 0.0);
        assert_eq!(a, b);
        assert_ne!(a, model.embed("Other text entirely").await.unwrap());
    }
}
