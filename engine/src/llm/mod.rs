//! Language-model client layer
//!
//! This module provides the seams between the pipeline and its
//! language-model collaborators: a `CompletionModel` trait for free-text
//! generation (argument briefs, evaluation, evidence, summaries) and an
//! `EmbeddingModel` trait used by knowledge retrieval. The traits exist so
//! integration tests can swap in scripted models without network access.

use async_trait::async_trait;

pub mod anthropic;
pub mod embeddings;

pub use anthropic::AnthropicModel;
pub use embeddings::OpenAiEmbeddings;

/// Result type for language-model operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur during language-model operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

/// One completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system prompt
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,

    /// Maximum tokens in the response
    pub max_tokens: u32,

    /// Sampling temperature; provider default when unset.
    /// Kept as f64 so the wire value matches the configured one exactly.
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Free-text completion model
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Returns the name of the provider (e.g., "anthropic")
    fn name(&self) -> &str;

    /// Generate a text completion
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Text embedding model
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Embed a single text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Strip a markdown code fence from structured model output.
///
/// Models asked for JSON frequently wrap it in ```json fences, sometimes
/// with trailing prose after the closing fence. Returns the fence body when
/// one is present, otherwise the trimmed input unchanged. Content that is
/// malformed beyond fencing is left for the caller's parser to reject.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_opening = &trimmed[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let Some(newline) = after_opening.find('\n') else {
        return trimmed;
    };
    let body_start = fence_start + 3 + newline + 1;

    let Some(closing) = trimmed[body_start..].find("```") else {
        return trimmed;
    };
    let body_end = body_start + closing;

    if body_start >= body_end {
        return trimmed;
    }

    trimmed[body_start..body_end].trim()
}

/// Read an API key from the environment
pub(crate) fn api_key_from_env(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| LlmError::AuthenticationFailed(format!("{var} is not set")))
        .and_then(|v| {
            if v.trim().is_empty() {
                Err(LlmError::AuthenticationFailed(format!("{var} is empty")))
            } else {
                Ok(v)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("prompt")
            .with_system("system")
            .with_max_tokens(4000)
            .with_temperature(0.3);

        assert_eq!(request.prompt, "prompt");
        assert_eq!(request.system.as_deref(), Some("system"));
        assert_eq!(request.max_tokens, 4000);
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        let content = "```json\n{\"resolved\": true}\n```";
        assert_eq!(strip_code_fence(content), "{\"resolved\": true}");
    }

    #[test]
    fn test_strip_fence_without_language_tag() {
        let content = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(content), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fence_with_trailing_prose() {
        let content = "```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(strip_code_fence(content), "{\"a\": 1}");
    }

    #[test]
    fn test_unfenced_content_passes_through() {
        let content = "  {\"a\": 1}  ";
        assert_eq!(strip_code_fence(content), "{\"a\": 1}");
    }

    #[test]
    fn test_unclosed_fence_passes_through() {
        let content = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fence(content), content.trim());
    }
}
