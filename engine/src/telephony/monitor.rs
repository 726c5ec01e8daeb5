//! Completion monitor
//!
//! Polls a remote call until it reaches a terminal state or the timeout
//! budget runs out. Transient fetch errors are retried on the same budget;
//! there is no cancellation channel, so the timeout is the only bound.

use super::CallGateway;
use sdk::errors::DisputeError;
use sdk::types::{CallRecord, CallStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Polls the telephony platform for call completion
pub struct CompletionMonitor {
    gateway: Arc<dyn CallGateway>,
    poll_interval: Duration,
    timeout: Duration,
}

impl CompletionMonitor {
    pub fn new(gateway: Arc<dyn CallGateway>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            gateway,
            poll_interval,
            timeout,
        }
    }

    /// Wait for the call to finish.
    ///
    /// Returns the full call record on `done`. A `failed` remote status
    /// raises `CallFailed` carrying the last observed state; exceeding the
    /// timeout raises `CallTimeout`.
    pub async fn wait_for_completion(&self, call_id: &str) -> Result<CallRecord, DisputeError> {
        let start = Instant::now();

        loop {
            if start.elapsed() > self.timeout {
                return Err(DisputeError::CallTimeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;

            let record = match self.gateway.fetch_call(call_id).await {
                Ok(record) => record,
                Err(e) => {
                    // Transient fetch failure: retry on the same budget
                    warn!(call_id, error = %e, "error fetching call status, retrying");
                    continue;
                }
            };

            debug!(
                call_id,
                status = %record.status,
                elapsed_secs = start.elapsed().as_secs_f64(),
                "call status poll"
            );

            match record.status {
                CallStatus::Done => return Ok(record),
                CallStatus::Failed => {
                    return Err(DisputeError::CallFailed {
                        last_status: record.status.to_string(),
                    })
                }
                CallStatus::Initiated | CallStatus::InProgress | CallStatus::Processing => {}
            }
        }
    }
}
