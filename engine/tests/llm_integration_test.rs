//! Integration tests for the language-model clients
//!
//! Validates the completion and embedding wire formats against mock
//! provider endpoints.

use serde_json::json;
use shield_engine::config::{AnthropicConfig, EmbeddingsConfig};
use shield_engine::llm::{
    AnthropicModel, CompletionModel, CompletionRequest, EmbeddingModel, LlmError, OpenAiEmbeddings,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn anthropic(server: &MockServer) -> AnthropicModel {
    AnthropicModel::new(
        AnthropicConfig {
            base_url: server.uri(),
            model: "claude-sonnet-4-20250514".into(),
        },
        "sk-ant-test",
    )
}

#[tokio::test]
async fn completion_sends_model_and_concatenates_content_blocks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 1000,
            "messages": [{"role": "user", "content": "Analyze this transcript"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "The customer "},
                {"type": "text", "text": "kept the subscription."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = anthropic(&server)
        .complete(CompletionRequest::new("Analyze this transcript").with_max_tokens(1000))
        .await
        .expect("completion");

    assert_eq!(response, "The customer kept the subscription.");
}

#[tokio::test]
async fn completion_carries_system_prompt_and_temperature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "system": "Extract customer decisions only",
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "user decided to renew"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = anthropic(&server)
        .complete(
            CompletionRequest::new("transcript here")
                .with_system("Extract customer decisions only")
                .with_temperature(0.3),
        )
        .await
        .expect("completion");

    assert_eq!(response, "user decided to renew");
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limit_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"type": "rate_limit_error", "message": "Too many requests"}
        })))
        .mount(&server)
        .await;

    let err = anthropic(&server)
        .complete(CompletionRequest::new("prompt"))
        .await
        .expect_err("should fail");
    assert!(matches!(err, LlmError::RateLimitExceeded));
}

#[tokio::test]
async fn invalid_key_maps_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let err = anthropic(&server)
        .complete(CompletionRequest::new("prompt"))
        .await
        .expect_err("should fail");
    assert!(matches!(err, LlmError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn embeddings_send_model_and_parse_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-openai-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "subscription_canceled Pro Plan Jane Doe"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, -0.2, 0.3]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = OpenAiEmbeddings::new(
        EmbeddingsConfig {
            base_url: server.uri(),
            model: "text-embedding-3-small".into(),
        },
        "sk-openai-test",
    );

    let vector = model
        .embed("subscription_canceled Pro Plan Jane Doe")
        .await
        .expect("vector");
    assert_eq!(vector, vec![0.1, -0.2, 0.3]);
}

#[tokio::test]
async fn empty_embedding_response_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let model = OpenAiEmbeddings::new(
        EmbeddingsConfig {
            base_url: server.uri(),
            model: "text-embedding-3-small".into(),
        },
        "sk-openai-test",
    );

    let err = model.embed("query").await.expect_err("should fail");
    assert!(matches!(err, LlmError::ParseError(_)));
}
