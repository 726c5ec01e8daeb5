//! Scripted call simulation
//!
//! Test mode for the pipeline: after a fixed settle delay, produces a
//! deterministic scripted transcript without touching the telephony
//! platform. The script is fixed at seven turns so downstream stages see a
//! realistic agent/user exchange.

use sdk::types::{CallMetadata, CallRecord, CallStatus, Speaker, TranscriptMessage};
use std::time::Duration;
use tracing::info;

/// The fixed scripted exchange: (speaker, text, seconds from call start)
const SCRIPT: [(Speaker, &str, f64); 7] = [
    (
        Speaker::Agent,
        "Hello, this is the customer care team calling about the dispute you opened on a recent charge.",
        0.0,
    ),
    (
        Speaker::User,
        "Oh right, I saw a charge I didn't recognize and asked my bank about it.",
        6.5,
    ),
    (
        Speaker::Agent,
        "I understand. That charge is the renewal of your subscription from earlier this month. I can walk you through the order details.",
        12.0,
    ),
    (
        Speaker::User,
        "I think I just forgot to cancel before the renewal date.",
        21.0,
    ),
    (
        Speaker::Agent,
        "No problem. I can either cancel it now with a prorated refund, or keep it active and apply a discount to this billing period.",
        26.5,
    ),
    (
        Speaker::User,
        "Actually the discount sounds fair, let's keep the subscription.",
        35.0,
    ),
    (
        Speaker::Agent,
        "Done. I've applied the discount and noted that you're withdrawing the dispute. Thanks for your time.",
        40.0,
    ),
];

/// Run the scripted call: settle, then return the fixed transcript.
pub async fn scripted_call(
    conversation_id: &str,
    agent_id: &str,
    settle_delay: Duration,
) -> CallRecord {
    info!(conversation_id, "running scripted call simulation");
    tokio::time::sleep(settle_delay).await;

    let transcript: Vec<TranscriptMessage> = SCRIPT
        .iter()
        .map(|(speaker, text, at)| TranscriptMessage::new(*speaker, *text, *at))
        .collect();

    let call_duration_secs = SCRIPT.last().map(|(_, _, at)| at + 5.0).unwrap_or(0.0);

    CallRecord {
        conversation_id: conversation_id.to_string(),
        agent_id: agent_id.to_string(),
        status: CallStatus::Done,
        user_id: None,
        transcript_summary: None,
        metadata: CallMetadata {
            start_time_unix_secs: chrono::Utc::now().timestamp(),
            call_duration_secs,
            cost: 0,
            termination_reason: Some("simulated".to_string()),
        },
        transcript,
    }
}
