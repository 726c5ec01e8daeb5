//! Transcript summarizer
//!
//! Extracts only the callee's decisions and actions from a finished
//! transcript, in the compact `user [action]; user [decision]` contract.
//! Agent turns are deliberately ignored. Summary failure is soft: the
//! conversation still completes without one.

use crate::llm::{CompletionModel, CompletionRequest};
use sdk::errors::DisputeError;
use sdk::types::TranscriptMessage;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an expert at analyzing customer service conversations. \
Your role is to extract ONLY customer decisions and actions from transcripts. \
You will receive a conversation transcript between a customer (user) and an agent. \
Focus EXCLUSIVELY on what the customer said, did, or decided. \
COMPLETELY IGNORE everything the agent said.

Output format: 'user [action]; user [decision]; user [action]'

Examples:
- 'user forgotten to cancel subscription; user decided to renew'
- 'user had chargeback issue; user wants refund'
- 'user never used product; user agreed to keep subscription'

Be EXTREMELY concise. Only include what the USER said, decided, or did. \
No agent statements, no explanations, no extra words.";

/// Produces the callee-decision summary of a call
pub struct TranscriptSummarizer {
    model: Arc<dyn CompletionModel>,
}

impl TranscriptSummarizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn summarize(
        &self,
        transcript: &[TranscriptMessage],
    ) -> Result<String, DisputeError> {
        let prompt = format!(
            "Analyze the transcript below and extract ONLY the customer's (user's) \
             decisions, actions, and statements. Ignore everything the agent said.\n\n{}",
            format_transcript(transcript)
        );

        let request = CompletionRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(1024)
            .with_temperature(0.3);

        let summary = self
            .model
            .complete(request)
            .await
            .map_err(|e| DisputeError::SummaryGeneration(e.to_string()))?;

        Ok(summary.trim().to_string())
    }
}

/// Render the transcript as `ROLE [t s]: text` lines; empty turns are
/// skipped.
fn format_transcript(transcript: &[TranscriptMessage]) -> String {
    transcript
        .iter()
        .filter(|msg| !msg.message.trim().is_empty())
        .map(|msg| {
            format!(
                "{} [{:.1}s]: {}",
                msg.role.to_string().to_uppercase(),
                msg.time_in_call_secs,
                msg.message.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
