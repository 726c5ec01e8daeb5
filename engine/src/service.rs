//! Intake and query surface
//!
//! `DisputeCallService` is the boundary callers talk to: create a
//! conversation for a disputed charge, submit it for execution on the
//! worker pool, poll its record, and list the archive. Intake data
//! (charge id, phone override) lives here until submission; the store
//! only ever holds conversation records.

use crate::archive::{ArchiveEntry, TranscriptArchive};
use crate::dispatch::{Dispatcher, Job};
use crate::pipeline::RunOptions;
use crate::store::ConversationStore;
use sdk::errors::DisputeError;
use sdk::types::Conversation;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Intake data held between create and submit
#[derive(Debug, Clone)]
struct Intake {
    charge_id: String,
    phone_override: Option<String>,
}

/// Front door of the dispute-call engine
pub struct DisputeCallService {
    store: ConversationStore,
    archive: TranscriptArchive,
    dispatcher: Dispatcher,
    pending: Mutex<HashMap<String, Intake>>,
}

impl DisputeCallService {
    pub fn new(
        store: ConversationStore,
        archive: TranscriptArchive,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            archive,
            dispatcher,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new conversation for a disputed charge.
    ///
    /// Inserts the InProgress record and returns its id; nothing executes
    /// until `submit`.
    pub fn create(&self, charge_id: &str, phone_override: Option<String>) -> String {
        let conversation_id = self.store.create();
        self.pending.lock().expect("intake map poisoned").insert(
            conversation_id.clone(),
            Intake {
                charge_id: charge_id.to_string(),
                phone_override,
            },
        );
        info!(conversation_id, charge_id, "conversation created");
        conversation_id
    }

    /// Enqueue the pipeline run for a created conversation.
    ///
    /// Rejects with `NotFound` for unknown ids and `QueueFull` when the
    /// worker pool's queue is at capacity.
    pub fn submit(&self, conversation_id: &str, options: RunOptions) -> Result<(), DisputeError> {
        let intake = self
            .pending
            .lock()
            .expect("intake map poisoned")
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| DisputeError::NotFound(conversation_id.to_string()))?;

        self.dispatcher.enqueue(Job {
            conversation_id: conversation_id.to_string(),
            charge_id: intake.charge_id,
            phone_override: intake.phone_override,
            options,
        })?;

        info!(
            conversation_id,
            simulate = options.simulate,
            "conversation submitted"
        );
        Ok(())
    }

    /// Fetch the current record of a conversation
    pub fn get(&self, conversation_id: &str) -> Result<Conversation, DisputeError> {
        self.store
            .get(conversation_id)
            .ok_or_else(|| DisputeError::NotFound(conversation_id.to_string()))
    }

    /// List archived transcripts, newest first
    pub fn list_archived_transcripts(&self) -> Result<Vec<ArchiveEntry>, DisputeError> {
        self.archive.list()
    }
}
