//! Argument brief synthesis
//!
//! Turns the raw charge metadata into a numbered list of leverage points the
//! voice agent can use on the call. This is the first language-model stage
//! of the pipeline and is fatal: without a brief there is nothing to argue.

use crate::llm::{CompletionModel, CompletionRequest};
use sdk::errors::DisputeError;
use sdk::types::BillingContext;
use std::sync::Arc;
use tracing::debug;

/// Generates the pre-call argument brief
pub struct BriefSynthesizer {
    model: Arc<dyn CompletionModel>,
}

impl BriefSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Produce the numbered argument list from the charge metadata.
    pub async fn synthesize(&self, context: &BillingContext) -> Result<String, DisputeError> {
        let prompt = format!(
            "Analyze the following charge metadata and extract all arguments we can \
             leverage when communicating with a customer who disputed this charge.\n\n\
             Charge Metadata:\n{}\n\n\
             Output ONLY a numbered list of arguments/evidence points. Each point should be:\n\
             - Clear and factual\n\
             - Based directly on the metadata\n\
             - Actionable for use in customer communication\n\n\
             Format: Simple numbered list, nothing more, nothing less. \
             No introduction, no conclusion, just the arguments.",
            format_metadata(context)
        );

        let request = CompletionRequest::new(prompt).with_max_tokens(2000);
        let brief = self
            .model
            .complete(request)
            .await
            .map_err(|e| DisputeError::BriefSynthesis(e.to_string()))?;

        debug!(chars = brief.len(), "argument brief synthesized");
        Ok(brief)
    }
}

/// Resolve the number to dial: explicit override wins, then the phone on the
/// billing context. No number at all means the call cannot be placed.
pub fn resolve_callee<'a>(
    context: &'a BillingContext,
    phone_override: Option<&'a str>,
) -> Result<&'a str, DisputeError> {
    phone_override
        .filter(|p| !p.is_empty())
        .or(context.customer.phone.as_deref())
        .ok_or_else(|| {
            DisputeError::CallInitiation(format!(
                "no phone number on file for charge {}",
                context.charge_id
            ))
        })
}

/// Render the metadata map as an indented key/value block for prompts.
pub(crate) fn format_metadata(context: &BillingContext) -> String {
    context
        .metadata
        .iter()
        .map(|(key, value)| format!("  {key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
