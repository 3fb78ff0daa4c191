//! Background usage metering
//!
//! Successful authentications enqueue a usage event; a single worker task
//! applies them in order. A full queue or a failing store drops the event
//! with a warning and never affects the request that produced it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};

#[derive(Debug)]
struct UsageEvent {
    key_id: ApiKeyId,
    at: DateTime<Utc>,
}

/// Handle to the usage worker; cheap to clone
#[derive(Debug, Clone)]
pub struct UsageRecorder {
    sender: mpsc::Sender<UsageEvent>,
}

impl UsageRecorder {
    /// Start the worker on the current runtime
    pub fn spawn(repository: Arc<dyn ApiKeyRepository>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(repository, receiver));

        Self { sender }
    }

    /// Enqueue a usage update without waiting
    pub fn record(&self, key_id: &ApiKeyId) {
        let event = UsageEvent {
            key_id: key_id.clone(),
            at: Utc::now(),
        };

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(key_id = %event.key_id, "Usage queue full, dropping usage update");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(key_id = %event.key_id, "Usage worker stopped, dropping usage update");
            }
        }
    }
}

async fn run_worker(
    repository: Arc<dyn ApiKeyRepository>,
    mut receiver: mpsc::Receiver<UsageEvent>,
) {
    while let Some(event) = receiver.recv().await {
        if let Err(e) = repository.record_usage(&event.key_id, event.at).await {
            warn!(key_id = %event.key_id, error = %e, "Failed to record API key usage");
        }
    }

    debug!("Usage worker stopped");
}
