use std::fmt;
use async_trait::async_trait;
use mb_core::{EmbeddingModel, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::models::endpoint;
use crate::Config;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>> {
        self.data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| Error::Inference("Embedding response contained no vector".to_string()))
    }
}

/// Client for any `/embeddings` endpoint speaking the OpenAI wire format.
pub struct OpenAiEmbeddingModel {
    client: Client,
    api_key: String,
    embeddings_url: Url,
    model: String,
}

impl fmt::Debug for OpenAiEmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbeddingModel")
            .field("api_key", &"<redacted>")
            .field("embeddings_url", &self.embeddings_url.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiEmbeddingModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .embedding_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("EMBEDDING_API_KEY not found in environment variables".to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            embeddings_url: endpoint(&config.embedding_base_url, "embeddings")?,
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddingModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.embeddings_url.clone())
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        response.into_vector()
    }
}
