use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tracing::info;
use uuid::Uuid;

/// Lifecycle phase of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchPhase {
    Validating,
    Generating,
    Funding,
    Confirming,
    Launching,
    Finalized,
    Aborted,
}

/// One progress emission: wallet `current` of `total` reached its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub current: u32,
    pub total: u32,
}

/// Snapshot served to progress queries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatus {
    pub phase: BatchPhase,
    pub current: u32,
    pub total: u32,
    pub updates: Vec<ProgressUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct TrackedBatch {
    status: BatchStatus,
    cancel_tx: watch::Sender<bool>,
}

/// Registry of in-flight and completed batches
///
/// Clones share the same underlying map, so the orchestrator and the API
/// observe the same state. Each batch carries a cancellation channel; the
/// receiver handed out at registration is the orchestrator's cancel signal.
#[derive(Clone)]
pub struct BatchTracker {
    batches: Arc<RwLock<HashMap<Uuid, TrackedBatch>>>,
}

impl BatchTracker {
    pub fn new() -> Self {
        Self {
            batches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new batch and hand back its cancellation receiver.
    pub async fn register(&self, id: Uuid, total: u32) -> watch::Receiver<bool> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut batches = self.batches.write().await;
        batches.insert(
            id,
            TrackedBatch {
                status: BatchStatus {
                    phase: BatchPhase::Validating,
                    current: 0,
                    total,
                    updates: Vec::new(),
                    error: None,
                },
                cancel_tx,
            },
        );
        cancel_rx
    }

    pub async fn set_phase(&self, id: Uuid, phase: BatchPhase) {
        let mut batches = self.batches.write().await;
        if let Some(tracked) = batches.get_mut(&id) {
            tracked.status.phase = phase;
        }
    }

    pub async fn record_progress(&self, id: Uuid, update: ProgressUpdate) {
        let mut batches = self.batches.write().await;
        if let Some(tracked) = batches.get_mut(&id) {
            tracked.status.current = update.current;
            tracked.status.updates.push(update);
        }
    }

    pub async fn set_error(&self, id: Uuid, error: String) {
        let mut batches = self.batches.write().await;
        if let Some(tracked) = batches.get_mut(&id) {
            tracked.status.error = Some(error);
        }
    }

    /// Flip a batch's cancellation flag
    ///
    /// Returns true only when the cancellation can still take effect:
    /// unknown ids and batches already in a terminal phase return false.
    pub async fn cancel(&self, id: Uuid) -> bool {
        let batches = self.batches.read().await;
        match batches.get(&id) {
            Some(tracked) => {
                if matches!(
                    tracked.status.phase,
                    BatchPhase::Finalized | BatchPhase::Aborted
                ) {
                    return false;
                }
                info!("cancellation requested for batch {}", id);
                let _ = tracked.cancel_tx.send(true);
                true
            }
            None => false,
        }
    }

    pub async fn status(&self, id: Uuid) -> Option<BatchStatus> {
        let batches = self.batches.read().await;
        batches.get(&id).map(|tracked| tracked.status.clone())
    }
}

impl Default for BatchTracker {
    fn default() -> Self {
        Self::new()
    }
}
