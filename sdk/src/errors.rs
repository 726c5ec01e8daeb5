//! Error types and handling
//!
//! This module provides the error taxonomy used throughout the dispute-call
//! engine. Variants map one-to-one onto pipeline stages, so the orchestrator
//! can decide fatal-vs-soft by matching on the variant instead of catching
//! everything at one boundary.
//!
//! Fatal errors short-circuit the pipeline and become the conversation's
//! terminal error string, verbatim. Soft errors are logged at their stage
//! boundary and never change the terminal status.

use thiserror::Error;

/// Trait for dispute error extensions
///
/// Provides additional context for errors: whether the error terminates the
/// conversation, and a hint that is safe to display to end users (no API
/// keys, no internal paths).
pub trait DisputeErrorExt {
    /// Returns whether the error fails the whole conversation.
    ///
    /// Non-fatal errors are caught at their stage boundary; the conversation
    /// still completes, simply without the stage's output (summary or
    /// evidence).
    fn is_fatal(&self) -> bool;

    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;
}

/// Main pipeline error type
///
/// Fatal variants carry the collaborator's message verbatim so that a Failed
/// conversation exposes exactly what the collaborator reported.
#[derive(Debug, Error)]
pub enum DisputeError {
    // Stage 1: billing context resolution (fatal)
    #[error("{0}")]
    ContextFetch(String),

    // Stage 2: argument brief synthesis (fatal)
    #[error("argument synthesis failed: {0}")]
    BriefSynthesis(String),

    // Stage 5: call placement and completion (fatal)
    #[error("failed to initiate call: {0}")]
    CallInitiation(String),

    #[error("call did not complete within {timeout_secs} seconds")]
    CallTimeout { timeout_secs: u64 },

    #[error("call ended in terminal state '{last_status}'")]
    CallFailed { last_status: String },

    // Stage 7: transcript summary (soft)
    #[error("summary generation failed: {0}")]
    SummaryGeneration(String),

    // Stage 8: transcript evaluation (soft, evidence path only)
    #[error("transcript evaluation failed: {0}")]
    TranscriptEvaluation(String),

    // Stage 9: evidence synthesis and submission (soft)
    #[error("evidence generation failed: {0}")]
    EvidenceGeneration(String),

    #[error("evidence submission failed: {0}")]
    EvidenceSubmission(String),

    // Transcript archival
    #[error("archive error: {0}")]
    Archive(String),

    // Intake and scheduling
    #[error("conversation not found: {0}")]
    NotFound(String),

    #[error("dispatch queue is full")]
    QueueFull,

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl DisputeErrorExt for DisputeError {
    fn is_fatal(&self) -> bool {
        match self {
            Self::ContextFetch(_)
            | Self::BriefSynthesis(_)
            | Self::CallInitiation(_)
            | Self::CallTimeout { .. }
            | Self::CallFailed { .. } => true,

            Self::SummaryGeneration(_)
            | Self::TranscriptEvaluation(_)
            | Self::EvidenceGeneration(_)
            | Self::EvidenceSubmission(_)
            | Self::Archive(_) => false,

            Self::NotFound(_) | Self::QueueFull | Self::Config(_) => false,
        }
    }

    fn user_hint(&self) -> &str {
        match self {
            Self::ContextFetch(_) => "Billing data unavailable. Check the charge id and API keys",
            Self::BriefSynthesis(_) => "Language-model call failed. Check API keys and network",
            Self::CallInitiation(_) => "Call could not be placed. Check telephony configuration",
            Self::CallTimeout { .. } => "The call never reached a terminal state. Try again",
            Self::CallFailed { .. } => "The remote side reported the call as failed",
            Self::SummaryGeneration(_) => "Summary was skipped; the transcript is still available",
            Self::TranscriptEvaluation(_) => "Evaluation was skipped; evidence was not generated",
            Self::EvidenceGeneration(_) => "Evidence was omitted from the result",
            Self::EvidenceSubmission(_) => "Evidence was generated but not submitted",
            Self::Archive(_) => "Transcript could not be written to the archive directory",
            Self::NotFound(_) => "No conversation with that id exists",
            Self::QueueFull => "Too many conversations in flight. Retry later",
            Self::Config(_) => "Check your config.toml file for errors",
        }
    }
}
