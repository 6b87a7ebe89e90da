use std::fmt;
use async_trait::async_trait;
use mb_core::{ChatModel, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::Config;
use super::endpoint;

const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatRequest {
    fn user(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

impl ChatResponse {
    fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Inference("Chat completion returned no content".to_string()))
    }
}

/// OpenAI-compatible chat completion client, pointed at DeepSeek by default.
pub struct DeepSeekModel {
    client: Client,
    api_key: String,
    completions_url: Url,
    model: String,
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("completions_url", &self.completions_url.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl DeepSeekModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .chat_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("DEEPSEEK_API_KEY not found in environment variables".to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            completions_url: endpoint(&config.chat_base_url, "chat/completions")?,
            model: config.chat_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::user(&self.model, prompt);

        let response = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_requires_api_key() {
        let result = DeepSeekModel::new(&Config::default());
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Configuration error: DEEPSEEK_API_KEY not found in environment variables"
        );

        let config = Config {
            chat_api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        let model = DeepSeekModel::new(&config).unwrap();
        assert_eq!(model.completions_url.as_str(), "https://api.deepseek.com/v1/chat/completions");
        assert!(!format!("{:?}", model).contains("test-key"));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::user("deepseek-chat", "Respond with OK");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Respond with OK");
        assert_eq!(json["max_tokens"], 2048);
    }

    #[test]
    fn test_response_content_is_trimmed() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  ## Brief\n"}}]}"#).unwrap();
        assert_eq!(response.into_content().unwrap(), "## Brief");
    }

    #[test]
    fn test_empty_response_is_an_error() {
        for raw in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            let response: ChatResponse = serde_json::from_str(raw).unwrap();
            assert!(response.into_content().is_err(), "{}", raw);
        }
    }
}
