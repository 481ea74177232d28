//! Error Types
//!
//! Failure taxonomy for the batch pipeline:
//! - `BatchError`: reasons a batch aborts before launching starts
//! - `GatewayError`: chain RPC failures (timeouts, outages, terminal tx errors)
//! - `LaunchServiceError`: failures of the external creation endpoint
//! - `StoreError`: persistence failures
//!
//! Per-wallet launch failure is not an error here; it is recorded as data in
//! `LaunchOutcome::Failed` and never aborts a batch.

use thiserror::Error;

/// Reasons a batch aborts before any wallet launches
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("wallet generation failed: {0}")]
    GenerationFailed(String),

    #[error("funding failed: {reason}")]
    FundingFailed { reason: String },

    #[error("batch cancelled")]
    Cancelled,
}

/// Failures surfaced by the chain gateway
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Every attempt of a time-boxed call exhausted its time box.
    #[error("gateway timed out: {0}")]
    Timeout(String),

    /// The RPC endpoint kept failing until the retry ceiling was reached.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The transaction's validity window elapsed unconfirmed.
    #[error(
        "transaction expired: block height {observed_height} passed the last valid height {last_valid_block_height}"
    )]
    TransactionExpired {
        last_valid_block_height: u64,
        observed_height: u64,
    },

    /// The network returned a terminal error for the transaction.
    #[error("transaction rejected: {0}")]
    TransactionRejected(String),
}

/// Failures of a single call to the external creation endpoint
///
/// Both variants are retryable from the invoker's point of view; the split
/// only records whether the request made it to the service.
#[derive(Debug, Clone, Error)]
pub enum LaunchServiceError {
    #[error("launch request failed: {0}")]
    Transport(String),

    #[error("launch rejected: {0}")]
    Rejected(String),
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
