//! Integration tests for the telephony gateway
//!
//! Validates outbound call placement and conversation retrieval against a
//! mock voice-agent platform.

use serde_json::json;
use shield_engine::config::TelephonyConfig;
use shield_engine::telephony::{CallError, CallGateway, ElevenLabsGateway, OutboundCall};
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> TelephonyConfig {
    TelephonyConfig {
        base_url: server.uri(),
        agent_id: "agent_test".into(),
        phone_number_id: "pn_test".into(),
        ..TelephonyConfig::default()
    }
}

fn call() -> OutboundCall {
    OutboundCall {
        to_number: "+15550001111".into(),
        persona: "You are a helpful customer service agent".into(),
        dynamic_variables: BTreeMap::from([(
            "customer_name".to_string(),
            "Jane Doe".to_string(),
        )]),
    }
}

#[tokio::test]
async fn place_call_sends_persona_override_and_returns_call_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/convai/twilio/outbound-call"))
        .and(header("xi-api-key", "el_test_key"))
        .and(body_partial_json(json!({
            "agent_id": "agent_test",
            "agent_phone_number_id": "pn_test",
            "to_number": "+15550001111",
            "conversation_initiation_client_data": {
                "conversation_config_override": {
                    "agent": {
                        "prompt": {"prompt": "You are a helpful customer service agent"}
                    }
                },
                "dynamic_variables": {"customer_name": "Jane Doe"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "conversation_id": "conv_remote_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ElevenLabsGateway::new(config(&server), "el_test_key");
    let call_id = gateway.place_call(&call()).await.expect("call id");
    assert_eq!(call_id, "conv_remote_1");
}

#[tokio::test]
async fn place_call_without_agent_id_is_a_config_error() {
    let server = MockServer::start().await;
    let gateway = ElevenLabsGateway::new(
        TelephonyConfig {
            base_url: server.uri(),
            agent_id: String::new(),
            phone_number_id: "pn_test".into(),
            ..TelephonyConfig::default()
        },
        "el_test_key",
    );

    let err = gateway.place_call(&call()).await.expect_err("should fail");
    assert!(matches!(err, CallError::Config(_)));
}

#[tokio::test]
async fn fetch_call_parses_transcript_and_summary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations/conv_remote_1"))
        .and(header("xi-api-key", "el_test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv_remote_1",
            "agent_id": "agent_test",
            "status": "done",
            "transcript": [
                {"role": "agent", "message": "Hello, calling about your dispute", "time_in_call_secs": 0.0},
                {"role": "user", "message": null, "tool_calls": [{"name": "lookup"}]},
                {"role": "user", "message": "Oh right, the subscription", "time_in_call_secs": 4.5}
            ],
            "metadata": {
                "start_time_unix_secs": 1700000000,
                "call_duration_secs": 37.2,
                "cost": 12,
                "termination_reason": "call ended"
            },
            "analysis": {"transcript_summary": "user discussed the subscription charge"}
        })))
        .mount(&server)
        .await;

    let gateway = ElevenLabsGateway::new(config(&server), "el_test_key");
    let record = gateway.fetch_call("conv_remote_1").await.expect("record");

    assert_eq!(record.conversation_id, "conv_remote_1");
    assert_eq!(record.status, sdk::types::CallStatus::Done);
    // Null-message tool entry is dropped
    assert_eq!(record.transcript.len(), 2);
    assert_eq!(record.transcript[1].message, "Oh right, the subscription");
    assert_eq!(record.metadata.call_duration_secs, 37.2);
    assert_eq!(
        record.transcript_summary.as_deref(),
        Some("user discussed the subscription charge")
    );
}

#[tokio::test]
async fn invalid_key_maps_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations/conv_remote_1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": {"status": "invalid_api_key", "message": "Invalid API key"}
        })))
        .mount(&server)
        .await;

    let gateway = ElevenLabsGateway::new(config(&server), "bad_key");
    let err = gateway
        .fetch_call("conv_remote_1")
        .await
        .expect_err("should fail");
    assert!(matches!(err, CallError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn platform_error_carries_status_and_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/convai/twilio/outbound-call"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": "phone number is not valid"
        })))
        .mount(&server)
        .await;

    let gateway = ElevenLabsGateway::new(config(&server), "el_test_key");
    let err = gateway.place_call(&call()).await.expect_err("should fail");
    match err {
        CallError::Api { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("phone number is not valid"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
