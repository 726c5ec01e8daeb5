// Shield Dispute-Call Engine
// Main entry point for the shield binary

use anyhow::Context;
use clap::Parser;
use shield_engine::archive::TranscriptArchive;
use shield_engine::billing::StripeGateway;
use shield_engine::cli::{Cli, Command};
use shield_engine::config::Config;
use shield_engine::dispatch::Dispatcher;
use shield_engine::knowledge;
use shield_engine::llm::{AnthropicModel, OpenAiEmbeddings};
use shield_engine::pipeline::{Collaborators, Orchestrator, RunOptions};
use shield_engine::service::DisputeCallService;
use shield_engine::store::ConversationStore;
use shield_engine::telemetry::{init_telemetry, set_log_level};
use shield_engine::telephony::{CallGateway, ElevenLabsGateway};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize telemetry first so config-loading errors are logged too
    let telemetry = init_telemetry();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Raise to the CLI override or the config-driven level; RUST_LOG wins
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    set_log_level(&telemetry, log_level);

    tracing::info!("Shield Engine v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Call {
            charge_id,
            phone,
            simulate,
            submit,
        } => handle_call(&config, &charge_id, phone, simulate, submit, cli.json).await,

        Command::Transcripts => handle_transcripts(&config, cli.json),
    }
}

/// Wire the collaborators, run one conversation, and poll until terminal.
async fn handle_call(
    config: &Config,
    charge_id: &str,
    phone: Option<String>,
    simulate: bool,
    submit: bool,
    json: bool,
) -> anyhow::Result<()> {
    let simulate = simulate || config.telephony.simulate;

    let model = Arc::new(
        AnthropicModel::from_env(config.llm.anthropic.clone())
            .context("completion model unavailable")?,
    );

    let billing = Arc::new(
        StripeGateway::from_env(config.billing.clone()).context("billing gateway unavailable")?,
    );

    // Scripted calls never touch the gateway, so no key is required for them
    let telephony: Arc<dyn CallGateway> = if simulate {
        Arc::new(ElevenLabsGateway::new(config.telephony.clone(), String::new()))
    } else {
        Arc::new(
            ElevenLabsGateway::from_env(config.telephony.clone())
                .context("telephony gateway unavailable")?,
        )
    };

    let knowledge = if config.knowledge.index_url.is_empty() {
        None
    } else {
        let embeddings = Arc::new(
            OpenAiEmbeddings::from_env(config.llm.embeddings.clone())
                .context("embedding model unavailable")?,
        );
        knowledge::from_config(&config.knowledge, embeddings)
            .context("knowledge index unavailable")?
    };

    let store = ConversationStore::in_memory();
    let archive = TranscriptArchive::new(&config.core.transcript_dir)?;

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        archive.clone(),
        Collaborators {
            billing,
            telephony,
            knowledge,
            model,
        },
        config.telephony.clone(),
        config.evidence.clone(),
    ));
    let dispatcher = Dispatcher::start(
        orchestrator,
        config.dispatch.workers,
        config.dispatch.queue_capacity,
    );
    let service = DisputeCallService::new(store, archive, dispatcher);

    let conversation_id = service.create(charge_id, phone);
    let options = RunOptions {
        simulate,
        submit_immediately: submit || config.evidence.submit_immediately,
    };
    service.submit(&conversation_id, options)?;
    println!("Conversation {conversation_id} submitted, waiting for completion...");

    let record = loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let record = service.get(&conversation_id)?;
        if record.status != sdk::types::ConversationStatus::InProgress {
            break record;
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("\nConversation: {}", record.conversation_id);
    println!("Status:       {:?}", record.status);
    if let Some(duration) = record.duration_seconds {
        println!("Duration:     {duration:.1}s");
    }
    if let Some(transcript) = &record.transcript {
        println!("Transcript:   {} turns", transcript.len());
    }
    if let Some(summary) = &record.summary {
        println!("Summary:      {summary}");
    }
    if let Some(evidence) = &record.evidence_result {
        println!(
            "Evidence:     {} fields generated, dispute {} ({}{})",
            evidence.evidence_generated.len(),
            evidence.dispute_id,
            if evidence.submitted {
                "submitted"
            } else {
                "staged"
            },
            if evidence.complete { "" } else { ", incomplete" },
        );
    }
    if let Some(error) = &record.error {
        println!("Error:        {error}");
    }

    Ok(())
}

/// List the transcript archive.
fn handle_transcripts(config: &Config, json: bool) -> anyhow::Result<()> {
    let archive = TranscriptArchive::new(&config.core.transcript_dir)?;
    let entries = archive.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "No archived transcripts in {}",
            config.core.transcript_dir.display()
        );
        return Ok(());
    }

    println!("Archived transcripts ({}):", entries.len());
    for entry in &entries {
        println!(
            "  {}  {}  {:.1}s  {} messages  [{}]",
            entry.saved_at,
            entry.conversation_id,
            entry.duration_secs,
            entry.message_count,
            entry.filename,
        );
    }

    Ok(())
}
