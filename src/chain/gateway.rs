//! Chain Gateway
//!
//! Thin reliability layer over the Solana RPC client. The gateway owns no
//! batch state; it turns raw RPC calls into the three operations the
//! pipeline needs (fee context, balance, submit-and-confirm) with timeouts,
//! bounded retries, and a clean failure taxonomy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::retry::RetryPolicy;

/// Network fee context for building and confirming one transaction
///
/// `last_valid_block_height` already includes the configured safety margin;
/// the transaction is treated as expired once the network's block height
/// passes it.
#[derive(Debug, Clone, Copy)]
pub struct FeeContext {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Remote ledger operations used by the batch pipeline
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Fetch the latest blockhash and its validity window.
    async fn fee_context(&self) -> Result<FeeContext, GatewayError>;

    /// Current lamport balance of `account`. Single time-boxed call.
    async fn balance(&self, account: &Pubkey) -> Result<u64, GatewayError>;

    /// Submit a signed transaction and poll until it confirms, is rejected,
    /// or its validity window elapses.
    async fn submit_and_confirm(
        &self,
        transaction: &Transaction,
        context: &FeeContext,
    ) -> Result<Signature, GatewayError>;
}

/// `ChainGateway` over a shared `RpcClient`
///
/// The client handle is created once per process and reused across batches;
/// the gateway itself is stateless beyond it.
pub struct RpcChainGateway {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    request_timeout: Duration,
    retry: RetryPolicy,
    confirm_poll_interval: Duration,
    max_confirm_poll_failures: u32,
    block_height_margin: u64,
}

impl RpcChainGateway {
    /// Build a gateway with its own RPC client from configuration.
    pub fn new(config: &GatewayConfig) -> Self {
        let commitment = parse_commitment(&config.commitment);
        let client = Arc::new(RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            commitment,
        ));
        Self::with_client(client, config)
    }

    /// Build a gateway over an existing RPC client handle.
    pub fn with_client(client: Arc<RpcClient>, config: &GatewayConfig) -> Self {
        Self {
            client,
            commitment: parse_commitment(&config.commitment),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            retry: config.retry_policy(),
            confirm_poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
            max_confirm_poll_failures: config.max_confirm_poll_failures,
            block_height_margin: config.block_height_margin,
        }
    }

    /// Poll the signature status until it is confirmed, rejected, or the
    /// validity window passes. Individual polls are time-boxed.
    async fn await_confirmation(
        &self,
        signature: &Signature,
        context: &FeeContext,
    ) -> Result<(), GatewayError> {
        poll_for_confirmation(
            self.confirm_poll_interval,
            self.max_confirm_poll_failures,
            context.last_valid_block_height,
            || async move {
                match tokio::time::timeout(
                    self.request_timeout,
                    self.client
                        .get_signature_status_with_commitment(signature, self.commitment),
                )
                .await
                {
                    Ok(Ok(Some(Ok(())))) => {
                        debug!("transaction {} confirmed", signature);
                        StatusPoll::Confirmed
                    }
                    Ok(Ok(Some(Err(err)))) => StatusPoll::Rejected(err.to_string()),
                    Ok(Ok(None)) => StatusPoll::Pending,
                    Ok(Err(err)) => {
                        warn!("status poll for {} failed: {}", signature, err);
                        StatusPoll::Unreachable
                    }
                    Err(_) => {
                        warn!("status poll for {} timed out", signature);
                        StatusPoll::Unreachable
                    }
                }
            },
            || async move {
                match tokio::time::timeout(self.request_timeout, self.client.get_block_height())
                    .await
                {
                    Ok(Ok(height)) => HeightPoll::Height(height),
                    Ok(Err(err)) => {
                        warn!("block height query failed: {}", err);
                        HeightPoll::Unreachable
                    }
                    Err(_) => {
                        warn!("block height query timed out");
                        HeightPoll::Unreachable
                    }
                }
            },
        )
        .await
    }
}

/// One observation of the transaction's signature status
enum StatusPoll {
    Confirmed,
    Rejected(String),
    Pending,
    Unreachable,
}

/// One observation of the network's block height
enum HeightPoll {
    Height(u64),
    Unreachable,
}

/// Confirmation poll loop over two observation sources
///
/// Exits when the status confirms or rejects, when the observed height
/// passes the validity window, or when either source fails
/// `max_poll_failures` times in a row. Status and height failures are
/// bounded separately: a pending status must not mask a dead height
/// endpoint, otherwise an unconfirmed transaction could hold the loop
/// open past its validity window with no exit condition left.
async fn poll_for_confirmation<S, SFut, H, HFut>(
    poll_interval: Duration,
    max_poll_failures: u32,
    last_valid_block_height: u64,
    mut status: S,
    mut height: H,
) -> Result<(), GatewayError>
where
    S: FnMut() -> SFut,
    SFut: std::future::Future<Output = StatusPoll>,
    H: FnMut() -> HFut,
    HFut: std::future::Future<Output = HeightPoll>,
{
    let mut status_failures = 0u32;
    let mut height_failures = 0u32;

    loop {
        tokio::time::sleep(poll_interval).await;

        match status().await {
            StatusPoll::Confirmed => return Ok(()),
            StatusPoll::Rejected(err) => return Err(GatewayError::TransactionRejected(err)),
            StatusPoll::Pending => status_failures = 0,
            StatusPoll::Unreachable => status_failures += 1,
        }

        match height().await {
            HeightPoll::Height(observed) if observed > last_valid_block_height => {
                return Err(GatewayError::TransactionExpired {
                    last_valid_block_height,
                    observed_height: observed,
                });
            }
            HeightPoll::Height(_) => height_failures = 0,
            HeightPoll::Unreachable => height_failures += 1,
        }

        if status_failures >= max_poll_failures || height_failures >= max_poll_failures {
            return Err(GatewayError::Unavailable(format!(
                "confirmation polling failed {} times in a row",
                status_failures.max(height_failures)
            )));
        }
    }
}

#[async_trait]
impl ChainGateway for RpcChainGateway {
    async fn fee_context(&self) -> Result<FeeContext, GatewayError> {
        let result = self
            .retry
            .run("fee context fetch", || async move {
                self.client
                    .get_latest_blockhash_with_commitment(self.commitment)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;

        match result {
            Ok((blockhash, last_valid_block_height)) => {
                let extended = last_valid_block_height.saturating_add(self.block_height_margin);
                debug!(
                    "fee context: blockhash {}, last valid height {} (+{} margin)",
                    blockhash, extended, self.block_height_margin
                );
                Ok(FeeContext {
                    blockhash,
                    last_valid_block_height: extended,
                })
            }
            Err(err) if err.timed_out => Err(GatewayError::Timeout(err.to_string())),
            Err(err) => Err(GatewayError::Unavailable(err.to_string())),
        }
    }

    async fn balance(&self, account: &Pubkey) -> Result<u64, GatewayError> {
        match tokio::time::timeout(self.request_timeout, self.client.get_balance(account)).await {
            Ok(Ok(lamports)) => Ok(lamports),
            Ok(Err(err)) => Err(GatewayError::Unavailable(format!(
                "balance query for {} failed: {}",
                account, err
            ))),
            Err(_) => Err(GatewayError::Timeout(format!(
                "balance query for {} timed out",
                account
            ))),
        }
    }

    async fn submit_and_confirm(
        &self,
        transaction: &Transaction,
        context: &FeeContext,
    ) -> Result<Signature, GatewayError> {
        let signature = match tokio::time::timeout(
            self.request_timeout,
            self.client.send_transaction(transaction),
        )
        .await
        {
            Ok(Ok(signature)) => signature,
            Ok(Err(err)) => {
                return Err(GatewayError::TransactionRejected(format!(
                    "submission failed: {}",
                    err
                )));
            }
            Err(_) => {
                return Err(GatewayError::Timeout(
                    "transaction submission timed out".to_string(),
                ));
            }
        };

        info!("submitted transaction {}", signature);
        self.await_confirmation(&signature, context).await?;
        Ok(signature)
    }
}

fn parse_commitment(label: &str) -> CommitmentConfig {
    match label {
        "processed" => CommitmentConfig::processed(),
        "confirmed" => CommitmentConfig::confirmed(),
        "finalized" => CommitmentConfig::finalized(),
        other => {
            warn!("unknown commitment level '{}', using confirmed", other);
            CommitmentConfig::confirmed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_interval() -> Duration {
        Duration::from_millis(1)
    }

    #[tokio::test]
    async fn confirmed_status_ends_polling() {
        let result = poll_for_confirmation(
            fast_interval(),
            3,
            1_000,
            || async { StatusPoll::Confirmed },
            || async { HeightPoll::Height(10) },
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejected_status_surfaces_as_rejection() {
        let result = poll_for_confirmation(
            fast_interval(),
            3,
            1_000,
            || async { StatusPoll::Rejected("insufficient funds".to_string()) },
            || async { HeightPoll::Height(10) },
        )
        .await;

        match result {
            Err(GatewayError::TransactionRejected(reason)) => {
                assert!(reason.contains("insufficient funds"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn height_past_window_expires_the_transaction() {
        let heights = AtomicU32::new(998);
        let result = poll_for_confirmation(
            fast_interval(),
            3,
            1_000,
            || async { StatusPoll::Pending },
            || {
                let observed = heights.fetch_add(1, Ordering::SeqCst) + 1;
                async move { HeightPoll::Height(observed as u64) }
            },
        )
        .await;

        match result {
            Err(GatewayError::TransactionExpired {
                last_valid_block_height,
                observed_height,
            }) => {
                assert_eq!(last_valid_block_height, 1_000);
                assert_eq!(observed_height, 1_001);
            }
            other => panic!("expected expiry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn pending_status_with_dead_height_endpoint_is_bounded() {
        // The status stays pending while every height query fails: the loop
        // must still exit once the height failures reach the bound.
        let height_calls = AtomicU32::new(0);
        let result = poll_for_confirmation(
            fast_interval(),
            3,
            1_000,
            || async { StatusPoll::Pending },
            || {
                height_calls.fetch_add(1, Ordering::SeqCst);
                async { HeightPoll::Unreachable }
            },
        )
        .await;

        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        assert_eq!(height_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn repeated_status_failures_are_bounded() {
        let result = poll_for_confirmation(
            fast_interval(),
            3,
            1_000,
            || async { StatusPoll::Unreachable },
            || async { HeightPoll::Height(10) },
        )
        .await;

        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }

    #[tokio::test]
    async fn transient_height_failures_are_tolerated() {
        // One failed height query between good ones never reaches the
        // bound; the loop keeps going until the status confirms.
        let polls = AtomicU32::new(0);
        let result = poll_for_confirmation(
            fast_interval(),
            2,
            1_000,
            || {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        StatusPoll::Pending
                    } else {
                        StatusPoll::Confirmed
                    }
                }
            },
            || {
                let n = polls.load(Ordering::SeqCst);
                async move {
                    if n % 2 == 0 {
                        HeightPoll::Unreachable
                    } else {
                        HeightPoll::Height(10)
                    }
                }
            },
        )
        .await;

        assert!(result.is_ok());
    }

    #[test]
    fn commitment_labels_parse() {
        assert_eq!(parse_commitment("processed"), CommitmentConfig::processed());
        assert_eq!(parse_commitment("confirmed"), CommitmentConfig::confirmed());
        assert_eq!(parse_commitment("finalized"), CommitmentConfig::finalized());
        // Unknown labels fall back to confirmed.
        assert_eq!(parse_commitment("garbage"), CommitmentConfig::confirmed());
    }
}
