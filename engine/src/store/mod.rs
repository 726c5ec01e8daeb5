//! Conversation store
//!
//! Concurrency-safe map from conversation id to its current record. The map
//! access is the only shared critical section in the engine: the lock is
//! held for the duration of one get or one atomic full-record replace, never
//! for a pipeline run, so unbounded pipelines can execute concurrently while
//! record mutation stays serialized.
//!
//! The backing map sits behind the `RecordStore` trait so the in-memory
//! implementation can be swapped for a distributed store without touching
//! pipeline logic.

use sdk::types::{Conversation, ConversationStatus, EvidenceResult, Turn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Injectable key-value record store: get plus atomic full-record replace.
///
/// Implementations must guarantee that a reader never observes a
/// half-written record; `put` replaces the whole record under one critical
/// section.
pub trait RecordStore: Send + Sync {
    /// Fetch a snapshot of the record for `id`, if any
    fn get(&self, id: &str) -> Option<Conversation>;

    /// Atomically replace (or insert) the record for `id`
    fn put(&self, id: &str, record: Conversation);
}

/// In-memory record store backed by a mutex-protected map
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, id: &str) -> Option<Conversation> {
        let records = self.records.lock().expect("record map poisoned");
        records.get(id).cloned()
    }

    fn put(&self, id: &str, record: Conversation) {
        let mut records = self.records.lock().expect("record map poisoned");
        records.insert(id.to_string(), record);
    }
}

/// Typed facade over a `RecordStore` for conversation lifecycle operations
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<dyn RecordStore>,
}

impl ConversationStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self { inner }
    }

    /// In-memory store, the default for a single-process deployment
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Generate a fresh unique id and insert an `InProgress` record.
    pub fn create(&self) -> String {
        let id = format!("conv_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        self.inner.put(&id, Conversation::in_progress(&id));
        id
    }

    /// Fetch a snapshot of the conversation, if it exists
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.inner.get(id)
    }

    /// Terminal write: mark the conversation completed.
    ///
    /// Single atomic full-record replace; the lock covers only the map
    /// access, not any stage of the pipeline that produced the inputs.
    pub fn complete(
        &self,
        id: &str,
        transcript: Vec<Turn>,
        duration_seconds: f64,
        summary: Option<String>,
        evidence_result: Option<EvidenceResult>,
    ) {
        let record = Conversation {
            conversation_id: id.to_string(),
            status: ConversationStatus::Completed,
            transcript: Some(transcript),
            duration_seconds: Some(duration_seconds),
            summary,
            evidence_result,
            error: None,
        };
        self.inner.put(id, record);
    }

    /// Terminal write: mark the conversation failed.
    ///
    /// The transcript stays unset; only the elapsed duration and the
    /// captured error message survive.
    pub fn fail(&self, id: &str, error: impl Into<String>, duration_seconds: f64) {
        let record = Conversation {
            conversation_id: id.to_string(),
            status: ConversationStatus::Failed,
            transcript: None,
            duration_seconds: Some(duration_seconds),
            summary: None,
            evidence_result: None,
            error: Some(error.into()),
        };
        self.inner.put(id, record);
    }
}
