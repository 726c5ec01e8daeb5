//! Transcript evaluation
//!
//! Judges a finished call against the fixed evaluation schema: did the call
//! resolve the dispute, how, and how did the customer feel about it. The
//! judgment feeds evidence synthesis; a malformed judgment is a hard parse
//! error caught at the evidence boundary, so no evidence is generated from
//! an unparseable evaluation.

use crate::llm::{strip_code_fence, CompletionModel, CompletionRequest};
use sdk::errors::DisputeError;
use sdk::types::{Evaluation, TranscriptMessage};
use std::sync::Arc;
use tracing::debug;

/// Produces the structured judgment of a call transcript
pub struct TranscriptEvaluator {
    model: Arc<dyn CompletionModel>,
}

impl TranscriptEvaluator {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn evaluate(
        &self,
        transcript: &[TranscriptMessage],
    ) -> Result<Evaluation, DisputeError> {
        let prompt = format!(
            "Analyze this customer service call transcript regarding a disputed charge.\n\n\
             TRANSCRIPT:\n{}\n\n\
             Provide a JSON response with the following structure:\n\
             {{\n\
                 \"resolved\": true/false,\n\
                 \"resolution_type\": \"renewed|canceled|partial_refund|pending|unresolved\",\n\
                 \"customer_sentiment\": \"satisfied|neutral|frustrated|angry\",\n\
                 \"key_points\": [\"point 1\", \"point 2\", ...],\n\
                 \"recommendation\": \"recommended action to take\"\n\
             }}\n\n\
             Evaluation criteria:\n\
             - RESOLVED: Customer agreed to keep subscription, accepted refund, or issue was fully resolved\n\
             - UNRESOLVED: Customer still wants chargeback, hung up angry, or no agreement reached\n\
             - Resolution types:\n\
               * renewed: Customer agreed to keep the subscription\n\
               * canceled: Customer agreed to cancel (avoiding chargeback)\n\
               * partial_refund: Compromise reached with partial refund\n\
               * pending: Needs follow-up action\n\
               * unresolved: No agreement, customer still disputing\n\n\
             Return ONLY the JSON, no other text.",
            format_transcript_excerpt(transcript, None)
        );

        let request = CompletionRequest::new(prompt).with_max_tokens(1000);
        let response = self
            .model
            .complete(request)
            .await
            .map_err(|e| DisputeError::TranscriptEvaluation(e.to_string()))?;

        let json = strip_code_fence(&response);
        let evaluation: Evaluation = serde_json::from_str(json).map_err(|e| {
            DisputeError::TranscriptEvaluation(format!("model did not return valid JSON: {e}"))
        })?;

        debug!(
            resolved = evaluation.resolved,
            resolution_type = ?evaluation.resolution_type,
            sentiment = %evaluation.customer_sentiment,
            "transcript evaluated"
        );
        Ok(evaluation)
    }
}

/// Render transcript turns as `[t s] ROLE: text` lines, optionally bounded
/// to the first `max_messages` turns.
pub(crate) fn format_transcript_excerpt(
    transcript: &[TranscriptMessage],
    max_messages: Option<usize>,
) -> String {
    let bound = max_messages.unwrap_or(transcript.len());
    transcript
        .iter()
        .take(bound)
        .map(|msg| {
            format!(
                "[{:.1}s] {}: {}",
                msg.time_in_call_secs,
                msg.role.to_string().to_uppercase(),
                msg.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, Result as LlmResult};
    use async_trait::async_trait;
    use sdk::types::{ResolutionType, Speaker};

    struct CannedModel {
        response: std::result::Result<String, ()>,
    }

    #[async_trait]
    impl CompletionModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: CompletionRequest) -> LlmResult<String> {
            self.response
                .clone()
                .map_err(|_| LlmError::ProviderUnavailable("canned outage".into()))
        }
    }

    fn transcript() -> Vec<TranscriptMessage> {
        vec![
            TranscriptMessage::new(Speaker::Agent, "Hello", 0.0),
            TranscriptMessage::new(Speaker::User, "I want to keep the subscription", 5.0),
        ]
    }

    #[tokio::test]
    async fn parses_plain_json_judgment() {
        let model = Arc::new(CannedModel {
            response: Ok(r#"{"resolved": true, "resolution_type": "renewed", "customer_sentiment": "satisfied", "key_points": ["kept subscription"], "recommendation": "close dispute"}"#.to_string()),
        });
        let evaluator = TranscriptEvaluator::new(model);

        let evaluation = evaluator.evaluate(&transcript()).await.expect("evaluation");
        assert!(evaluation.resolved);
        assert_eq!(evaluation.resolution_type, ResolutionType::Renewed);
        assert_eq!(evaluation.key_points, vec!["kept subscription"]);
    }

    #[tokio::test]
    async fn tolerates_fenced_json() {
        let model = Arc::new(CannedModel {
            response: Ok("```json\n{\"resolved\": false, \"resolution_type\": \"unresolved\", \"customer_sentiment\": \"angry\"}\n```".to_string()),
        });
        let evaluator = TranscriptEvaluator::new(model);

        let evaluation = evaluator.evaluate(&transcript()).await.expect("evaluation");
        assert!(!evaluation.resolved);
        assert_eq!(evaluation.resolution_type, ResolutionType::Unresolved);
        // Omitted optional fields default
        assert!(evaluation.key_points.is_empty());
        assert!(evaluation.recommendation.is_empty());
    }

    #[tokio::test]
    async fn malformed_judgment_is_a_hard_parse_error() {
        let model = Arc::new(CannedModel {
            response: Ok("The call went well, I think it's resolved.".to_string()),
        });
        let evaluator = TranscriptEvaluator::new(model);

        let err = evaluator
            .evaluate(&transcript())
            .await
            .expect_err("should fail");
        assert!(matches!(err, DisputeError::TranscriptEvaluation(_)));
    }

    #[tokio::test]
    async fn model_outage_maps_to_evaluation_error() {
        let model = Arc::new(CannedModel { response: Err(()) });
        let evaluator = TranscriptEvaluator::new(model);

        let err = evaluator
            .evaluate(&transcript())
            .await
            .expect_err("should fail");
        assert!(matches!(err, DisputeError::TranscriptEvaluation(_)));
    }

    #[test]
    fn excerpt_is_bounded_when_requested() {
        let transcript: Vec<TranscriptMessage> = (0..15)
            .map(|i| TranscriptMessage::new(Speaker::User, format!("turn {i}"), i as f64))
            .collect();

        let excerpt = format_transcript_excerpt(&transcript, Some(10));
        assert_eq!(excerpt.lines().count(), 10);
        assert!(excerpt.starts_with("[0.0s] USER: turn 0"));
    }
}
