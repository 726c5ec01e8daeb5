//! Shield Engine Library
//!
//! Core functionality of the dispute-call engine: the conversation
//! orchestration pipeline, its collaborator clients, and the intake
//! service. Used by both the `shield` binary and integration tests.

/// Configuration management module
pub mod config;

/// Transcript archive module
pub mod archive;

/// Billing platform client layer
pub mod billing;

/// Pipeline dispatch worker pool
pub mod dispatch;

/// Knowledge retrieval module
pub mod knowledge;

/// Language-model client layer
pub mod llm;

/// Conversation orchestration pipeline
pub mod pipeline;

/// Intake and query surface
pub mod service;

/// Conversation store module
pub mod store;

/// Telephony client layer
pub mod telephony;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;
