//! Pipeline dispatch
//!
//! Bounded worker pool feeding pipeline runs to the orchestrator. Submission
//! goes through `try_send` on a bounded channel, so a full queue rejects the
//! request immediately instead of piling up unbounded background tasks.
//! Workers share one receiver; each pulls the next job when its current
//! pipeline run finishes.

use crate::pipeline::{Orchestrator, RunOptions};
use async_trait::async_trait;
use sdk::errors::DisputeError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One queued pipeline run
#[derive(Debug, Clone)]
pub struct Job {
    pub conversation_id: String,
    pub charge_id: String,
    pub phone_override: Option<String>,
    pub options: RunOptions,
}

/// Executes one queued job to completion
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self, job: Job);
}

#[async_trait]
impl JobRunner for Orchestrator {
    async fn run_job(&self, job: Job) {
        self.run(
            &job.conversation_id,
            &job.charge_id,
            job.phone_override.as_deref(),
            job.options,
        )
        .await;
    }
}

/// Handle for submitting jobs to the worker pool
#[derive(Clone)]
pub struct Dispatcher {
    sender: mpsc::Sender<Job>,
}

impl Dispatcher {
    /// Spawn `workers` worker tasks over a queue of `queue_capacity` slots.
    pub fn start(runner: Arc<dyn JobRunner>, workers: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        for worker_id in 0..workers {
            let receiver = receiver.clone();
            let runner = runner.clone();
            tokio::spawn(async move {
                loop {
                    // Hold the lock only while waiting for the next job,
                    // never while running one.
                    let job = { receiver.lock().await.recv().await };
                    let Some(job) = job else {
                        debug!(worker_id, "dispatch queue closed, worker exiting");
                        break;
                    };
                    debug!(
                        worker_id,
                        conversation_id = %job.conversation_id,
                        "worker picked up job"
                    );
                    runner.run_job(job).await;
                }
            });
        }

        info!(workers, queue_capacity, "dispatch pool started");
        Self { sender }
    }

    /// Submit a job; rejects immediately when the queue is at capacity.
    pub fn enqueue(&self, job: Job) -> Result<(), DisputeError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DisputeError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => {
                DisputeError::Config("dispatch queue is closed".into())
            }
        })
    }
}
