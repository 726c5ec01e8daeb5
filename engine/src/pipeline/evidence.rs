//! Evidence synthesis and submission
//!
//! Generates the written evidence fields for the dispute from the call
//! outcome and pushes them to the billing platform. Seven fields are
//! generated by the language model with slot-specific instructions; five
//! more are passed through from the charge metadata with fixed fallbacks.
//!
//! Slot generation is best-effort: a failed slot is skipped and the result
//! is tagged incomplete rather than discarding the slots that did generate.
//! Submission failure, by contrast, drops the whole result, since evidence
//! that never reached the platform has no value to report.

use super::evaluator::format_transcript_excerpt;
use crate::billing::BillingGateway;
use crate::llm::{CompletionModel, CompletionRequest};
use sdk::errors::DisputeError;
use sdk::types::{BillingContext, Evaluation, EvidenceResult, TranscriptMessage};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The seven generated evidence slots with their slot-specific instructions
const GENERATED_SLOTS: [(&str, &str); 7] = [
    (
        "access_activity_log",
        "Generate a detailed access activity log showing service usage. Include dates, actions, and proof of engagement.",
    ),
    (
        "cancellation_rebuttal",
        "Write a professional rebuttal explaining why the cancellation claim is invalid, using evidence from metadata and call.",
    ),
    (
        "cancellation_policy_disclosure",
        "Explain how and when the cancellation policy was presented to the customer.",
    ),
    (
        "product_description",
        "Write a detailed product description including features and billing terms.",
    ),
    (
        "refund_policy_disclosure",
        "Explain how the refund policy was disclosed to the customer.",
    ),
    (
        "refund_refusal_explanation",
        "Provide a detailed explanation of why a refund cannot be issued, citing evidence.",
    ),
    (
        "uncategorized_text",
        "Generate comprehensive dispute evidence including email history, usage metrics, and merchant position.",
    ),
];

/// Bounded transcript excerpt shared by every slot prompt
const EXCERPT_MESSAGES: usize = 10;

/// Generates and submits dispute evidence
pub struct EvidenceSynthesizer {
    model: Arc<dyn CompletionModel>,
    billing: Arc<dyn BillingGateway>,
    max_field_chars: usize,
}

impl EvidenceSynthesizer {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        billing: Arc<dyn BillingGateway>,
        max_field_chars: usize,
    ) -> Self {
        Self {
            model,
            billing,
            max_field_chars,
        }
    }

    /// Generate all evidence fields and submit them to the billing platform.
    ///
    /// Returns the evidence result on successful submission, tagged with
    /// `complete = false` when one or more generated slots were skipped.
    pub async fn synthesize_and_submit(
        &self,
        context: &BillingContext,
        transcript: &[TranscriptMessage],
        evaluation: Evaluation,
        submit_immediately: bool,
    ) -> Result<EvidenceResult, DisputeError> {
        let mut generated: BTreeMap<String, String> = BTreeMap::new();
        let mut complete = true;

        for (slot, instruction) in GENERATED_SLOTS {
            match self
                .generate_slot(slot, instruction, context, transcript, &evaluation)
                .await
            {
                Ok(text) => {
                    generated.insert(slot.to_string(), cap_chars(&text, self.max_field_chars));
                }
                Err(e) => {
                    warn!(slot, error = %e, "evidence slot generation failed, skipping");
                    complete = false;
                }
            }
        }

        if generated.is_empty() {
            return Err(DisputeError::EvidenceGeneration(
                "no evidence slot could be generated".into(),
            ));
        }

        let mut fields = generated.clone();
        for (field, value) in pass_through_fields(&context.metadata) {
            fields.insert(field, value);
        }

        let status = self
            .billing
            .submit_evidence(&context.dispute_id, &fields, submit_immediately)
            .await
            .map_err(|e| DisputeError::EvidenceSubmission(e.to_string()))?;

        debug!(
            dispute_id = %context.dispute_id,
            slots = generated.len(),
            submitted = submit_immediately,
            status = %status,
            "evidence submitted"
        );

        Ok(EvidenceResult {
            dispute_id: context.dispute_id.clone(),
            evaluation,
            evidence_generated: generated,
            status,
            submitted: submit_immediately,
            complete,
        })
    }

    async fn generate_slot(
        &self,
        slot: &str,
        instruction: &str,
        context: &BillingContext,
        transcript: &[TranscriptMessage],
        evaluation: &Evaluation,
    ) -> Result<String, DisputeError> {
        let prompt = format!(
            "You are a dispute evidence specialist. Generate professional, factual \
             evidence text for dispute submission.\n\n\
             FIELD: {slot}\n\
             TASK: {instruction}\n\n\
             CHARGE METADATA:\n{}\n\n\
             CONVERSATION OUTCOME:\n\
             - Resolved: {}\n\
             - Resolution Type: {:?}\n\
             - Customer Sentiment: {}\n\
             - Key Points: {}\n\n\
             RECENT CONVERSATION EXCERPT:\n{}\n\n\
             REQUIREMENTS:\n\
             - Be factual and professional\n\
             - Use specific dates, numbers, and metrics from the metadata\n\
             - Reference the conversation outcome if relevant\n\
             - Maximum {} characters\n\
             - Include concrete evidence only\n\
             - Organize with clear sections if needed\n\n\
             Generate the evidence text now:",
            super::brief::format_metadata(context),
            evaluation.resolved,
            evaluation.resolution_type,
            evaluation.customer_sentiment,
            evaluation.key_points.join(", "),
            format_transcript_excerpt(transcript, Some(EXCERPT_MESSAGES)),
            self.max_field_chars,
        );

        let request = CompletionRequest::new(prompt).with_max_tokens(4000);
        self.model
            .complete(request)
            .await
            .map_err(|e| DisputeError::EvidenceGeneration(e.to_string()))
    }
}

/// The five metadata pass-through fields with their fallback values.
///
/// `service_date` falls back from the subscription start to the billing
/// period start before giving up.
pub(crate) fn pass_through_fields(
    metadata: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let lookup = |key: &str, fallback: &str| {
        metadata
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };

    BTreeMap::from([
        (
            "billing_address".to_string(),
            lookup("billing_address", "Address on file with payment provider"),
        ),
        (
            "customer_email_address".to_string(),
            lookup("customer_email", "N/A"),
        ),
        ("customer_name".to_string(), lookup("customer_name", "N/A")),
        (
            "customer_purchase_ip".to_string(),
            lookup("purchase_ip", "N/A"),
        ),
        (
            "service_date".to_string(),
            metadata
                .get("subscription_start")
                .or_else(|| metadata.get("billing_period_start"))
                .cloned()
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ])
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn cap_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{BillingError, Result as BillingResult};
    use crate::llm::{LlmError, Result as LlmResult};
    use async_trait::async_trait;
    use sdk::types::{ChargeFacts, CustomerFacts, ProductFacts, ResolutionType, Speaker};
    use std::sync::Mutex;

    /// Model that fails for slots named in `failing` and otherwise echoes
    /// the slot name it finds in the prompt.
    struct SlotModel {
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl CompletionModel for SlotModel {
        fn name(&self) -> &str {
            "slot"
        }

        async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
            for slot in &self.failing {
                if request.prompt.contains(&format!("FIELD: {slot}")) {
                    return Err(LlmError::ProviderUnavailable("slot outage".into()));
                }
            }
            Ok("generated evidence text".to_string())
        }
    }

    /// Billing gateway that records the submitted fields
    struct RecordingGateway {
        submitted: Mutex<Option<(String, BTreeMap<String, String>, bool)>>,
        fail_submission: bool,
    }

    impl RecordingGateway {
        fn new(fail_submission: bool) -> Self {
            Self {
                submitted: Mutex::new(None),
                fail_submission,
            }
        }
    }

    #[async_trait]
    impl BillingGateway for RecordingGateway {
        async fn charge_context(&self, _charge_id: &str) -> BillingResult<BillingContext> {
            unimplemented!("not used by these tests")
        }

        async fn submit_evidence(
            &self,
            dispute_id: &str,
            fields: &BTreeMap<String, String>,
            submit_immediately: bool,
        ) -> BillingResult<String> {
            if self.fail_submission {
                return Err(BillingError::Api {
                    status: 500,
                    message: "platform down".into(),
                });
            }
            *self.submitted.lock().expect("lock") =
                Some((dispute_id.to_string(), fields.clone(), submit_immediately));
            Ok("under_review".to_string())
        }
    }

    fn context() -> BillingContext {
        BillingContext {
            charge_id: "ch_1".into(),
            dispute_id: "du_1".into(),
            dispute_reason: "subscription_canceled".into(),
            customer: CustomerFacts {
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                phone: None,
            },
            product: ProductFacts {
                name: "Pro Plan".into(),
                description: String::new(),
            },
            charge: ChargeFacts {
                amount_cents: 4999,
                currency: "usd".into(),
            },
            metadata: BTreeMap::from([
                ("customer_name".to_string(), "Jane Doe".to_string()),
                ("customer_email".to_string(), "jane@example.com".to_string()),
                ("subscription_start".to_string(), "2024-01-01".to_string()),
            ]),
        }
    }

    fn evaluation() -> Evaluation {
        Evaluation {
            resolved: true,
            resolution_type: ResolutionType::Renewed,
            customer_sentiment: "satisfied".into(),
            key_points: vec!["kept subscription".into()],
            recommendation: "close dispute".into(),
        }
    }

    fn transcript() -> Vec<TranscriptMessage> {
        vec![TranscriptMessage::new(Speaker::User, "I'll keep it", 5.0)]
    }

    #[tokio::test]
    async fn all_slots_generate_and_submit_with_pass_through_fields() {
        let billing = Arc::new(RecordingGateway::new(false));
        let synthesizer = EvidenceSynthesizer::new(
            Arc::new(SlotModel { failing: vec![] }),
            billing.clone(),
            20_000,
        );

        let result = synthesizer
            .synthesize_and_submit(&context(), &transcript(), evaluation(), false)
            .await
            .expect("result");

        assert!(result.complete);
        assert!(!result.submitted);
        assert_eq!(result.evidence_generated.len(), 7);
        assert_eq!(result.status, "under_review");

        let (dispute_id, fields, submit) =
            billing.submitted.lock().expect("lock").clone().expect("submitted");
        assert_eq!(dispute_id, "du_1");
        assert!(!submit);
        // 7 generated + 5 pass-through
        assert_eq!(fields.len(), 12);
        assert_eq!(fields.get("customer_name").map(String::as_str), Some("Jane Doe"));
        assert_eq!(fields.get("customer_purchase_ip").map(String::as_str), Some("N/A"));
        assert_eq!(fields.get("service_date").map(String::as_str), Some("2024-01-01"));
    }

    #[tokio::test]
    async fn failed_slot_is_skipped_and_result_tagged_incomplete() {
        let billing = Arc::new(RecordingGateway::new(false));
        let synthesizer = EvidenceSynthesizer::new(
            Arc::new(SlotModel {
                failing: vec!["cancellation_rebuttal", "uncategorized_text"],
            }),
            billing,
            20_000,
        );

        let result = synthesizer
            .synthesize_and_submit(&context(), &transcript(), evaluation(), true)
            .await
            .expect("result");

        assert!(!result.complete);
        assert!(result.submitted);
        assert_eq!(result.evidence_generated.len(), 5);
        assert!(!result.evidence_generated.contains_key("cancellation_rebuttal"));
    }

    #[tokio::test]
    async fn all_slots_failing_is_a_generation_error() {
        let billing = Arc::new(RecordingGateway::new(false));
        let synthesizer = EvidenceSynthesizer::new(
            Arc::new(SlotModel {
                failing: GENERATED_SLOTS.iter().map(|(slot, _)| *slot).collect(),
            }),
            billing,
            20_000,
        );

        let err = synthesizer
            .synthesize_and_submit(&context(), &transcript(), evaluation(), false)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DisputeError::EvidenceGeneration(_)));
    }

    #[tokio::test]
    async fn submission_failure_drops_the_result() {
        let billing = Arc::new(RecordingGateway::new(true));
        let synthesizer = EvidenceSynthesizer::new(
            Arc::new(SlotModel { failing: vec![] }),
            billing,
            20_000,
        );

        let err = synthesizer
            .synthesize_and_submit(&context(), &transcript(), evaluation(), false)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DisputeError::EvidenceSubmission(_)));
    }

    #[test]
    fn pass_through_service_date_falls_back_to_billing_period_start() {
        let metadata = BTreeMap::from([(
            "billing_period_start".to_string(),
            "2024-02-01".to_string(),
        )]);
        let fields = pass_through_fields(&metadata);
        assert_eq!(fields.get("service_date").map(String::as_str), Some("2024-02-01"));
        assert_eq!(
            fields.get("billing_address").map(String::as_str),
            Some("Address on file with payment provider")
        );
    }

    #[test]
    fn cap_chars_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(cap_chars(text, 4), "héll");
        assert_eq!(cap_chars(text, 100), text);
    }
}
