//! Shield SDK
//!
//! Shared library providing the domain types and error taxonomy for the
//! dispute-call engine. This crate is used by the engine and its
//! integration tests.

/// Error types and handling
pub mod errors;

/// Conversation, transcript, and evidence types
pub mod types;

// Re-export commonly used types
pub use errors::{DisputeError, DisputeErrorExt};
pub use types::{
    BillingContext, CallMetadata, CallRecord, CallStatus, ChargeFacts, Conversation,
    ConversationStatus, CustomerFacts, Evaluation, EvidenceResult, ProductFacts, ResolutionType,
    Speaker, TranscriptMessage, Turn,
};
