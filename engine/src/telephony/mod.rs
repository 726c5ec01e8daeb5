//! Telephony client layer
//!
//! Places outbound voice-agent calls and retrieves their transcripts. The
//! `CallGateway` trait is the seam between the pipeline and the remote
//! platform; `ElevenLabsGateway` is the REST implementation, `monitor`
//! drives the poll-until-terminal loop, and `simulate` produces the
//! deterministic scripted call used in test mode.

use async_trait::async_trait;
use sdk::types::CallRecord;
use std::collections::BTreeMap;

pub mod elevenlabs;
pub mod monitor;
pub mod simulate;

pub use elevenlabs::ElevenLabsGateway;
pub use monitor::CompletionMonitor;

/// Result type for telephony operations
pub type Result<T> = std::result::Result<T, CallError>;

/// Errors that can occur against the telephony platform
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("telephony API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing configuration: {0}")]
    Config(String),
}

/// Specification of one outbound call
#[derive(Debug, Clone)]
pub struct OutboundCall {
    /// Number to dial (format: +1234567890)
    pub to_number: String,

    /// Full composed agent persona for this call
    pub persona: String,

    /// Per-call template variables surfaced to the voice agent
    pub dynamic_variables: BTreeMap<String, String>,
}

/// Gateway to the voice-agent platform
#[async_trait]
pub trait CallGateway: Send + Sync {
    /// Initiate an outbound call; returns the remote call id
    async fn place_call(&self, call: &OutboundCall) -> Result<String>;

    /// Fetch the current state of a call, including any transcript so far
    async fn fetch_call(&self, call_id: &str) -> Result<CallRecord>;
}
