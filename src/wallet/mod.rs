//! Wallet Batch Module
//!
//! This module produces the per-batch wallets and the transaction that
//! funds them:
//! - generator: fresh keypair pairs and the single multi-transfer funding
//!   transaction, with an exact size check against the packet limit
//! - signer: the treasury signing seam; the orchestrator never holds the
//!   funding account's key material

mod generator;
mod signer;

pub use generator::{
    build_funding_transaction, check_funding_transaction_size, funding_transaction_size, generate,
};
pub use signer::{FundingSigner, KeypairSigner};
