//! Batch Pipeline Module
//!
//! This module coordinates whole batches:
//! - BatchOrchestrator: the per-batch state machine (validate, generate,
//!   fund, confirm, launch, finalize)
//! - BatchTracker: shared progress registry with per-batch cancellation
//!
//! Per-wallet launch failures never abort a batch; aborts only happen
//! before launching starts.

pub mod orchestrator;
pub mod tracker;


pub use orchestrator::BatchOrchestrator;
pub use tracker::{BatchPhase, BatchStatus, BatchTracker, ProgressUpdate};
