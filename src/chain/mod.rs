//! Chain Gateway Module
//!
//! This module wraps the remote ledger RPC endpoint:
//! - ChainGateway: the trait the orchestrator talks to
//! - RpcChainGateway: implementation over a long-lived Solana RPC client
//! - FeeContext: blockhash plus validity window for one transaction
//!
//! Every remote call is individually time-boxed; the fee-context fetch is
//! additionally retried with fixed backoff.

mod gateway;

pub use gateway::{ChainGateway, FeeContext, RpcChainGateway};
