use super::{CallError, CallGateway, OutboundCall};
use crate::config::TelephonyConfig;
use async_trait::async_trait;
use sdk::types::{CallMetadata, CallRecord, CallStatus, Speaker, TranscriptMessage};
use serde_json::json;

/// REST client for an ElevenLabs-shaped voice-agent platform
pub struct ElevenLabsGateway {
    config: TelephonyConfig,
    api_key: String,
    client: reqwest::Client,
}

impl ElevenLabsGateway {
    /// Create a gateway with an explicit API key (used by tests against mock servers)
    pub fn new(config: TelephonyConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a gateway reading the key from `ELEVENLABS_API_KEY`
    pub fn from_env(config: TelephonyConfig) -> super::Result<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
            CallError::AuthenticationFailed("ELEVENLABS_API_KEY is not set".into())
        })?;
        Ok(Self::new(config, api_key))
    }
}

#[async_trait]
impl CallGateway for ElevenLabsGateway {
    async fn place_call(&self, call: &OutboundCall) -> super::Result<String> {
        if self.config.agent_id.is_empty() {
            return Err(CallError::Config("telephony.agent_id is not set".into()));
        }
        if self.config.phone_number_id.is_empty() {
            return Err(CallError::Config(
                "telephony.phone_number_id is not set".into(),
            ));
        }

        let url = format!("{}/v1/convai/twilio/outbound-call", self.config.base_url);

        let payload = json!({
            "agent_id": self.config.agent_id,
            "agent_phone_number_id": self.config.phone_number_id,
            "to_number": call.to_number,
            "conversation_initiation_client_data": {
                "conversation_config_override": {
                    "agent": {
                        "prompt": {"prompt": call.persona}
                    }
                },
                "dynamic_variables": call.dynamic_variables,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        body.get("conversation_id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| CallError::Parse("no conversation_id in response".into()))
    }

    async fn fetch_call(&self, call_id: &str) -> super::Result<CallRecord> {
        let url = format!("{}/v1/convai/conversations/{call_id}", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        parse_call_record(&body)
    }
}

fn error_from_response(status: u16, body: &serde_json::Value) -> CallError {
    let message = body
        .get("detail")
        .map(|d| d.to_string())
        .unwrap_or_else(|| "no error detail".to_string());

    match status {
        401 | 403 => CallError::AuthenticationFailed(message),
        _ => CallError::Api { status, message },
    }
}

/// Parse the platform's conversation payload into a `CallRecord`.
///
/// Transcript entries with a null message are dropped, missing timestamps
/// default to 0, and unrecognized speaker roles are coerced to agent.
fn parse_call_record(data: &serde_json::Value) -> super::Result<CallRecord> {
    let conversation_id = data
        .get("conversation_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CallError::Parse("no conversation_id in payload".into()))?
        .to_string();

    let agent_id = data
        .get("agent_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let status: CallStatus = data
        .get("status")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| CallError::Parse(format!("unrecognized call status: {e}")))?
        .ok_or_else(|| CallError::Parse("no status in payload".into()))?;

    let mut transcript = Vec::new();
    if let Some(entries) = data.get("transcript").and_then(|t| t.as_array()) {
        for entry in entries {
            // Entries without a message carry tool traffic only
            let Some(message) = entry.get("message").and_then(|m| m.as_str()) else {
                continue;
            };

            let role = entry.get("role").and_then(|r| r.as_str()).unwrap_or("");
            transcript.push(TranscriptMessage {
                role: Speaker::from_role(role),
                message: message.to_string(),
                time_in_call_secs: entry
                    .get("time_in_call_secs")
                    .and_then(|t| t.as_f64())
                    .unwrap_or(0.0),
                tool_calls: entry.get("tool_calls").filter(|v| !v.is_null()).cloned(),
                tool_results: entry.get("tool_results").filter(|v| !v.is_null()).cloned(),
            });
        }
    }

    let meta = data.get("metadata");
    let meta_field = |key: &str| meta.and_then(|m| m.get(key));
    let metadata = CallMetadata {
        start_time_unix_secs: meta_field("start_time_unix_secs")
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        call_duration_secs: meta_field("call_duration_secs")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        cost: meta_field("cost").and_then(|v| v.as_i64()).unwrap_or(0),
        termination_reason: meta_field("termination_reason")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    };

    let transcript_summary = data
        .get("analysis")
        .and_then(|a| a.get("transcript_summary"))
        .and_then(|s| s.as_str())
        .map(str::to_string);

    Ok(CallRecord {
        conversation_id,
        agent_id,
        status,
        user_id: data
            .get("user_id")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        transcript_summary,
        metadata,
        transcript,
    })
}
