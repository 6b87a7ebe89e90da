use std::time::Duration;
use mb_core::{ChatModel, EmbeddingModel, Result};
use serde::Serialize;
use tracing::{info, warn};

pub const CHAT_PROBE_PROMPT: &str = "Respond with \"OK\" if you can read this message.";
pub const EMBEDDING_PROBE_TEXT: &str = "This is a test sentence for embedding generation.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub chat: bool,
    pub embedding: bool,
    pub errors: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.chat && self.embedding
    }
}

async fn probe<T, F>(label: &str, timeout: Duration, call: F) -> std::result::Result<T, String>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{} API: {}", label, e)),
        Err(_) => Err(format!("{} API: timed out after {:?}", label, timeout)),
    }
}

/// Sends one tiny request to each model and reports which ones answered.
pub async fn check_connectivity(
    chat: &dyn ChatModel,
    embedding: &dyn EmbeddingModel,
    timeout: Duration,
) -> HealthReport {
    let mut report = HealthReport::default();

    match probe("Chat", timeout, chat.complete(CHAT_PROBE_PROMPT)).await {
        Ok(reply) => {
            info!("🧠 {} answered: {}", chat.name(), reply);
            report.chat = true;
        }
        Err(e) => {
            warn!("❌ {}", e);
            report.errors.push(e);
        }
    }

    match probe("Embedding", timeout, embedding.embed(EMBEDDING_PROBE_TEXT)).await {
        Ok(vector) if !vector.is_empty() => {
            info!("🧬 {} returned a {}-dimensional vector", embedding.name(), vector.len());
            report.embedding = true;
        }
        Ok(_) => {
            let e = "Embedding API: empty vector".to_string();
            warn!("❌ {}", e);
            report.errors.push(e);
        }
        Err(e) => {
            warn!("❌ {}", e);
            report.errors.push(e);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use async_trait::async_trait;
    use mb_core::Error;

    struct Broken;

    #[async_trait]
    impl ChatModel for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(Error::Inference("401 Unauthorized".to_string()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl EmbeddingModel for Stalled {
        fn name(&self) -> &str {
            "Stalled"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![1.0])
        }
    }

    #[tokio::test]
    async fn test_dummy_models_are_healthy() {
        let dummy = DummyModel::new();
        let report = check_connectivity(&dummy, &dummy, Duration::from_secs(5)).await;
        assert!(report.is_healthy());
        assert!(report.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_collected() {
        let report = check_connectivity(&Broken, &Stalled, Duration::from_secs(30)).await;
        assert!(!report.chat);
        assert!(!report.embedding);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("401"));
        assert!(report.errors[1].contains("timed out"));
    }
}
