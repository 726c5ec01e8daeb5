use super::{EmbeddingModel, LlmError};
use crate::config::EmbeddingsConfig;
use async_trait::async_trait;
use serde_json::json;

/// Embedding client for the OpenAI embeddings API
pub struct OpenAiEmbeddings {
    config: EmbeddingsConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Create a client with an explicit API key (used by tests against mock servers)
    pub fn new(config: EmbeddingsConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client reading the key from `OPENAI_API_KEY`
    pub fn from_env(config: EmbeddingsConfig) -> super::Result<Self> {
        let api_key = super::api_key_from_env("OPENAI_API_KEY")?;
        Ok(Self::new(config, api_key))
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddings {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> super::Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);

        let payload = json!({
            "model": self.config.model,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => LlmError::RateLimitExceeded,
                401 | 403 => LlmError::AuthenticationFailed(text),
                _ => LlmError::ProviderUnavailable(format!(
                    "embeddings API error ({status}): {text}"
                )),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let embedding = data
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|e| e.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| LlmError::ParseError("no embedding in response".to_string()))?;

        embedding
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| LlmError::ParseError("non-numeric embedding value".to_string()))
            })
            .collect()
    }
}
