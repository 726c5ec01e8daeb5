use super::{CompletionModel, CompletionRequest, LlmError};
use crate::config::AnthropicConfig;
use async_trait::async_trait;
use serde_json::json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion client for the Anthropic messages API
pub struct AnthropicModel {
    config: AnthropicConfig,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicModel {
    /// Create a client with an explicit API key (used by tests against mock servers)
    pub fn new(config: AnthropicConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client reading the key from `ANTHROPIC_API_KEY`
    pub fn from_env(config: AnthropicConfig) -> super::Result<Self> {
        let api_key = super::api_key_from_env("ANTHROPIC_API_KEY")?;
        Ok(Self::new(config, api_key))
    }
}

#[async_trait]
impl CompletionModel for AnthropicModel {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> super::Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let mut payload = serde_json::Map::new();
        payload.insert("model".to_string(), json!(self.config.model));
        payload.insert("max_tokens".to_string(), json!(request.max_tokens));
        payload.insert(
            "messages".to_string(),
            json!([{"role": "user", "content": request.prompt}]),
        );

        if let Some(system) = &request.system {
            payload.insert("system".to_string(), json!(system));
        }
        if let Some(temperature) = request.temperature {
            payload.insert("temperature".to_string(), json!(temperature));
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 404 => LlmError::InvalidRequest(text),
                429 => LlmError::RateLimitExceeded,
                401 | 403 => LlmError::AuthenticationFailed(text),
                _ => LlmError::ProviderUnavailable(format!(
                    "Anthropic API error ({status}): {text}"
                )),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let blocks = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LlmError::ParseError("no content in response".to_string()))?;

        let mut full_text = String::new();
        for block in blocks {
            if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                full_text.push_str(text);
            }
        }

        if full_text.is_empty() {
            return Err(LlmError::ParseError(
                "no text blocks in response".to_string(),
            ));
        }

        Ok(full_text)
    }
}
