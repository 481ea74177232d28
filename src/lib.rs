//! Batch token-launch service: funds freshly generated Solana wallets from a
//! treasury in one transaction, drives a paced sequence of external token
//! creations (one per wallet), and persists each batch as a single document.

pub mod types; // Domain types: requests, wallet slots, outcomes, batch results.
pub mod error; // Failure taxonomy for the batch pipeline.
pub mod retry; // Bounded fixed-backoff retry shared by gateway and invoker.
pub mod config; // TOML configuration for every component.
pub mod chain; // Chain gateway over the Solana RPC endpoint.
pub mod wallet; // Wallet generation, funding transaction, treasury signer.
pub mod launch; // External creation service and the per-wallet invoker.
pub mod batch; // Batch orchestrator state machine and progress tracker.
pub mod store; // Result store: one persisted document per batch.
pub mod validation; // Request shape checks.
pub mod api; // HTTP surface over the orchestrator and store.
pub mod testing; // Scriptable doubles for the collaborator seams.

// Re-export commonly used types for easier access.
pub use types::*;
pub use config::Config;
pub use batch::BatchOrchestrator;
