//! Conversation, transcript, and evidence types
//!
//! The data model for one end-to-end dispute-resolution call: the tracked
//! `Conversation` record owned by the store, the raw `CallRecord` returned by
//! the telephony collaborator (also the archive's persisted form), and the
//! evaluation/evidence structures produced after the call ends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Speaker on a transcript turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    /// Map a raw role tag into the speaker set.
    ///
    /// Unrecognized roles are coerced to `Agent`, matching the remote
    /// transcript format where every non-user entry is agent output.
    pub fn from_role(role: &str) -> Self {
        match role {
            "user" => Speaker::User,
            _ => Speaker::Agent,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Agent => write!(f, "agent"),
        }
    }
}

/// One turn of the caller-facing transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Seconds from call start
    pub timestamp: f64,
}

/// Lifecycle status of a tracked conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    InProgress,
    Completed,
    Failed,
}

/// Tracked record of one dispute-resolution call attempt
///
/// Created at intake with status `InProgress` and no optional fields set.
/// Mutated exactly once, by the orchestrator, to a terminal status via an
/// atomic full-record replace; never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub status: ConversationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<Turn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_result: Option<EvidenceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Conversation {
    /// Fresh record as inserted at intake.
    pub fn in_progress(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            status: ConversationStatus::InProgress,
            transcript: None,
            duration_seconds: None,
            summary: None,
            evidence_result: None,
            error: None,
        }
    }
}

/// Classification of how, or whether, a call resolved the dispute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    Renewed,
    Canceled,
    PartialRefund,
    Pending,
    Unresolved,
}

/// Fixed-schema judgment of a finished call transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub resolved: bool,
    pub resolution_type: ResolutionType,
    pub customer_sentiment: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

/// Result of evidence synthesis and submission for one dispute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceResult {
    pub dispute_id: String,
    pub evaluation: Evaluation,
    /// Evidence-slot name to generated text
    pub evidence_generated: BTreeMap<String, String>,
    /// Submission status reported by the billing collaborator
    pub status: String,
    /// Whether the evidence was pushed to the bank immediately (vs staged)
    pub submitted: bool,
    /// False when one or more slots failed to generate and were omitted
    pub complete: bool,
}

/// Remote call lifecycle, as reported by the telephony collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallStatus {
    #[serde(rename = "initiated")]
    Initiated,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "failed")]
    Failed,
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Done | CallStatus::Failed)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Initiated => "initiated",
            CallStatus::InProgress => "in-progress",
            CallStatus::Processing => "processing",
            CallStatus::Done => "done",
            CallStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One message of the raw call transcript (persisted form)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptMessage {
    pub role: Speaker,
    pub message: String,
    pub time_in_call_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<serde_json::Value>,
}

impl TranscriptMessage {
    pub fn new(role: Speaker, message: impl Into<String>, time_in_call_secs: f64) -> Self {
        Self {
            role,
            message: message.into(),
            time_in_call_secs,
            tool_calls: None,
            tool_results: None,
        }
    }
}

/// Metadata about a finished call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallMetadata {
    pub start_time_unix_secs: i64,
    pub call_duration_secs: f64,
    pub cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

/// Complete call data including transcript and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub conversation_id: String,
    pub agent_id: String,
    pub status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,
    pub metadata: CallMetadata,
    pub transcript: Vec<TranscriptMessage>,
}

impl CallRecord {
    /// Project the raw transcript into the caller-facing turn sequence.
    pub fn turns(&self) -> Vec<Turn> {
        self.transcript
            .iter()
            .map(|msg| Turn {
                speaker: msg.role,
                text: msg.message.clone(),
                timestamp: msg.time_in_call_secs,
            })
            .collect()
    }
}

/// Customer facts resolved from the billing collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerFacts {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Product facts resolved from the billing collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductFacts {
    pub name: String,
    pub description: String,
}

/// Charge facts resolved from the billing collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeFacts {
    pub amount_cents: i64,
    pub currency: String,
}

/// Everything the pipeline needs to know about one disputed charge
///
/// Ephemeral: fetched once per pipeline run at the billing boundary and
/// never persisted. The loosely-typed charge metadata is kept alongside the
/// validated fields because the evidence prompts quote it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingContext {
    pub charge_id: String,
    pub dispute_id: String,
    pub dispute_reason: String,
    pub customer: CustomerFacts,
    pub product: ProductFacts,
    pub charge: ChargeFacts,
    pub metadata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_coerce_to_agent() {
        assert_eq!(Speaker::from_role("user"), Speaker::User);
        assert_eq!(Speaker::from_role("agent"), Speaker::Agent);
        assert_eq!(Speaker::from_role("system"), Speaker::Agent);
        assert_eq!(Speaker::from_role(""), Speaker::Agent);
    }

    #[test]
    fn fresh_conversation_has_no_optional_fields() {
        let conv = Conversation::in_progress("conv_abc");
        assert_eq!(conv.status, ConversationStatus::InProgress);
        assert!(conv.transcript.is_none());
        assert!(conv.duration_seconds.is_none());
        assert!(conv.summary.is_none());
        assert!(conv.evidence_result.is_none());
        assert!(conv.error.is_none());
    }

    #[test]
    fn call_status_terminal_states() {
        assert!(CallStatus::Done.is_terminal());
        assert!(CallStatus::Failed.is_terminal());
        assert!(!CallStatus::Initiated.is_terminal());
        assert!(!CallStatus::InProgress.is_terminal());
        assert!(!CallStatus::Processing.is_terminal());
    }

    #[test]
    fn call_status_wire_names() {
        let s: CallStatus = serde_json::from_str(r#""in-progress""#).expect("parse");
        assert_eq!(s, CallStatus::InProgress);
        assert_eq!(serde_json::to_string(&CallStatus::Done).expect("ser"), r#""done""#);
    }

    #[test]
    fn resolution_type_wire_names() {
        let r: ResolutionType = serde_json::from_str(r#""partial_refund""#).expect("parse");
        assert_eq!(r, ResolutionType::PartialRefund);
    }

    #[test]
    fn call_record_projects_turns_in_order() {
        let record = CallRecord {
            conversation_id: "conv_1".into(),
            agent_id: "agent_1".into(),
            status: CallStatus::Done,
            user_id: None,
            transcript_summary: None,
            metadata: CallMetadata {
                start_time_unix_secs: 0,
                call_duration_secs: 12.0,
                cost: 0,
                termination_reason: None,
            },
            transcript: vec![
                TranscriptMessage::new(Speaker::Agent, "Hello", 0.0),
                TranscriptMessage::new(Speaker::User, "Hi", 2.5),
            ],
        };

        let turns = record.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::Agent);
        assert_eq!(turns[1].text, "Hi");
        assert_eq!(turns[1].timestamp, 2.5);
    }
}
