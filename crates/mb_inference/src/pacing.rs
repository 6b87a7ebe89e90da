use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use mb_core::{ChatModel, Result};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Wraps a chat model so that calls run one at a time and each one starts at
/// least `interval` after the previous one finished, successful or not.
pub struct PacedChatModel {
    inner: Arc<dyn ChatModel>,
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl PacedChatModel {
    pub fn new(inner: Arc<dyn ChatModel>, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last_finished: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl ChatModel for PacedChatModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_finished = self.last_finished.lock().await;

        if let Some(finished) = *last_finished {
            let ready_at = finished + self.interval;
            if ready_at > Instant::now() {
                debug!("⏳ Pacing {} call for {:?}", self.inner.name(), ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }

        let result = self.inner.complete(prompt).await;
        *last_finished = Some(Instant::now());
        result
    }
}
