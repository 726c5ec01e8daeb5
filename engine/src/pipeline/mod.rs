//! Conversation orchestration pipeline
//!
//! Runs one dispute-resolution call end to end: resolve the billing
//! context, synthesize the argument brief, retrieve knowledge, compose the
//! agent persona, place (or simulate) the call, wait for completion, then
//! archive, summarize, evaluate, and submit evidence.
//!
//! Failure policy: stages 1-5 are fatal and turn the conversation Failed
//! with the stage error as its terminal message. Everything after a
//! completed call is soft; archive, summary, or evidence failure is logged
//! at its own boundary and the conversation still completes without that
//! stage's output. The orchestrator decides fatal-vs-soft by where the `?`
//! sits, not by catching everything at one seam.

use crate::archive::TranscriptArchive;
use crate::billing::BillingGateway;
use crate::config::{EvidenceConfig, TelephonyConfig};
use crate::knowledge::KnowledgeIndex;
use crate::llm::CompletionModel;
use crate::store::ConversationStore;
use crate::telephony::{simulate, CallGateway, CompletionMonitor, OutboundCall};
use sdk::errors::{DisputeError, DisputeErrorExt};
use sdk::types::{BillingContext, CallRecord, EvidenceResult, Turn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub mod brief;
pub mod evaluator;
pub mod evidence;
pub mod persona;
pub mod summarizer;

pub use brief::BriefSynthesizer;
pub use evaluator::TranscriptEvaluator;
pub use evidence::EvidenceSynthesizer;
pub use summarizer::TranscriptSummarizer;

/// Per-run options resolved at submission time
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Run the deterministic scripted call instead of dialing out
    pub simulate: bool,

    /// Push evidence to the bank immediately instead of staging it
    pub submit_immediately: bool,
}

/// The injected collaborator set
pub struct Collaborators {
    pub billing: Arc<dyn BillingGateway>,
    pub telephony: Arc<dyn CallGateway>,
    pub knowledge: Option<Arc<dyn KnowledgeIndex>>,
    pub model: Arc<dyn CompletionModel>,
}

/// Everything a completed pipeline hands to the store
struct Outcome {
    transcript: Vec<Turn>,
    /// Platform-reported call duration; scripted calls synthesize it from
    /// the last transcript timestamp
    duration_seconds: f64,
    summary: Option<String>,
    evidence_result: Option<EvidenceResult>,
}

/// Drives one conversation from charge id to terminal record
pub struct Orchestrator {
    store: ConversationStore,
    archive: TranscriptArchive,
    billing: Arc<dyn BillingGateway>,
    telephony: Arc<dyn CallGateway>,
    knowledge: Option<Arc<dyn KnowledgeIndex>>,
    brief: BriefSynthesizer,
    summarizer: TranscriptSummarizer,
    evaluator: TranscriptEvaluator,
    evidence: EvidenceSynthesizer,
    telephony_config: TelephonyConfig,
}

impl Orchestrator {
    pub fn new(
        store: ConversationStore,
        archive: TranscriptArchive,
        collaborators: Collaborators,
        telephony_config: TelephonyConfig,
        evidence_config: EvidenceConfig,
    ) -> Self {
        let Collaborators {
            billing,
            telephony,
            knowledge,
            model,
        } = collaborators;

        Self {
            store,
            archive,
            brief: BriefSynthesizer::new(model.clone()),
            summarizer: TranscriptSummarizer::new(model.clone()),
            evaluator: TranscriptEvaluator::new(model.clone()),
            evidence: EvidenceSynthesizer::new(
                model,
                billing.clone(),
                evidence_config.max_field_chars,
            ),
            billing,
            telephony,
            knowledge,
            telephony_config,
        }
    }

    /// Run the pipeline for one conversation and write its terminal record.
    ///
    /// Never returns an error: every outcome, success or failure, lands in
    /// the store as exactly one terminal write.
    pub async fn run(
        &self,
        conversation_id: &str,
        charge_id: &str,
        phone_override: Option<&str>,
        options: RunOptions,
    ) {
        let started = Instant::now();
        info!(
            conversation_id,
            charge_id,
            simulate = options.simulate,
            "pipeline started"
        );

        match self
            .execute(conversation_id, charge_id, phone_override, options)
            .await
        {
            Ok(outcome) => {
                self.store.complete(
                    conversation_id,
                    outcome.transcript,
                    outcome.duration_seconds,
                    outcome.summary,
                    outcome.evidence_result,
                );
                info!(
                    conversation_id,
                    duration_secs = outcome.duration_seconds,
                    "pipeline completed"
                );
            }
            Err(e) => {
                warn!(conversation_id, error = %e, hint = e.user_hint(), "pipeline failed");
                self.store.fail(
                    conversation_id,
                    e.to_string(),
                    started.elapsed().as_secs_f64(),
                );
            }
        }
    }

    async fn execute(
        &self,
        conversation_id: &str,
        charge_id: &str,
        phone_override: Option<&str>,
        options: RunOptions,
    ) -> Result<Outcome, DisputeError> {
        // Stage 1: billing context (fatal)
        let context = self
            .billing
            .charge_context(charge_id)
            .await
            .map_err(|e| DisputeError::ContextFetch(e.to_string()))?;

        // Stage 2: argument brief (fatal)
        let brief = self.brief.synthesize(&context).await?;

        // Stage 3: knowledge retrieval (soft)
        let knowledge_block = self.retrieve_knowledge(&context).await;

        // Stage 4: persona composition
        let persona = persona::compose_persona(&context, &brief, knowledge_block.as_deref());

        // Stage 5: the call itself (fatal)
        let record = self
            .place_and_await_call(conversation_id, &context, persona, phone_override, options)
            .await?;

        // Stage 6: archive (soft)
        if let Err(e) = self.archive.save(&record, conversation_id) {
            warn!(conversation_id, error = %e, "transcript archival failed");
        }

        // Stage 7: summary (soft)
        let summary = match self.summarizer.summarize(&record.transcript).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(conversation_id, error = %e, "summary skipped");
                None
            }
        };

        // Stages 8-9: evaluation and evidence (soft)
        let evidence_result = match self.run_evidence(&context, &record, options).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(conversation_id, error = %e, hint = e.user_hint(), "evidence skipped");
                None
            }
        };

        Ok(Outcome {
            transcript: record.turns(),
            duration_seconds: record.metadata.call_duration_secs,
            summary,
            evidence_result,
        })
    }

    async fn retrieve_knowledge(&self, context: &BillingContext) -> Option<String> {
        let index = self.knowledge.as_ref()?;
        match index
            .query(
                &context.dispute_reason,
                &context.product.name,
                &context.customer.name,
            )
            .await
        {
            Ok(knowledge) if !knowledge.is_empty() => Some(knowledge.format_for_prompt()),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "knowledge retrieval failed, proceeding without it");
                None
            }
        }
    }

    async fn place_and_await_call(
        &self,
        conversation_id: &str,
        context: &BillingContext,
        persona: String,
        phone_override: Option<&str>,
        options: RunOptions,
    ) -> Result<CallRecord, DisputeError> {
        if options.simulate {
            return Ok(simulate::scripted_call(
                conversation_id,
                &self.telephony_config.agent_id,
                Duration::from_secs(self.telephony_config.simulate_settle_secs),
            )
            .await);
        }

        // Per-request override beats the configured one, which beats the
        // number on the billing record.
        let callee = brief::resolve_callee(
            context,
            phone_override.or(self.telephony_config.phone_override.as_deref()),
        )?;

        let call = OutboundCall {
            to_number: callee.to_string(),
            persona,
            dynamic_variables: BTreeMap::from([
                ("customer_name".to_string(), context.customer.name.clone()),
                ("phone_number".to_string(), callee.to_string()),
                ("product_name".to_string(), context.product.name.clone()),
                (
                    "dispute_reason".to_string(),
                    context.dispute_reason.clone(),
                ),
            ]),
        };

        let call_id = self
            .telephony
            .place_call(&call)
            .await
            .map_err(|e| DisputeError::CallInitiation(e.to_string()))?;
        info!(conversation_id, call_id, "outbound call placed");

        let monitor = CompletionMonitor::new(
            self.telephony.clone(),
            Duration::from_secs(self.telephony_config.poll_interval_secs),
            Duration::from_secs(self.telephony_config.completion_timeout_secs),
        );
        monitor.wait_for_completion(&call_id).await
    }

    async fn run_evidence(
        &self,
        context: &BillingContext,
        record: &CallRecord,
        options: RunOptions,
    ) -> Result<EvidenceResult, DisputeError> {
        let evaluation = self.evaluator.evaluate(&record.transcript).await?;
        self.evidence
            .synthesize_and_submit(
                context,
                &record.transcript,
                evaluation,
                options.submit_immediately,
            )
            .await
    }
}
