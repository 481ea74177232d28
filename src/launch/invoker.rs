//! Launch Invoker
//!
//! Runs the creation capability for one wallet at a time under the bounded
//! retry policy and classifies the result. `launch` never returns an error:
//! exhausted retries become a `Failed` outcome carrying the attempt count,
//! so the orchestrator can rely on every wallet reaching a terminal state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LaunchConfig;
use crate::launch::service::LaunchService;
use crate::retry::RetryPolicy;
use crate::types::{LaunchOutcome, TokenMetadata, WalletSlot};

pub struct LaunchInvoker {
    service: Arc<dyn LaunchService>,
    retry: RetryPolicy,
}

impl LaunchInvoker {
    pub fn new(service: Arc<dyn LaunchService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    pub fn from_config(service: Arc<dyn LaunchService>, config: &LaunchConfig) -> Self {
        Self::new(service, config.retry_policy())
    }

    /// Launch one wallet's token
    ///
    /// # Returns
    /// A terminal `LaunchOutcome`: `Succeeded` with the token URL on the
    /// first successful attempt, or `Failed` with the final reason and the
    /// number of attempts spent once the retry ceiling is reached.
    pub async fn launch(&self, wallet: &WalletSlot, metadata: &TokenMetadata) -> LaunchOutcome {
        let result = self
            .retry
            .run("token creation", || self.service.create(wallet, metadata))
            .await;

        match result {
            Ok(receipt) => {
                info!("wallet {} launched: {}", wallet.index + 1, receipt.token_url);
                LaunchOutcome::Succeeded {
                    token_url: receipt.token_url,
                }
            }
            Err(err) => {
                warn!(
                    "wallet {} launch failed after {} attempt(s): {}",
                    wallet.index + 1,
                    err.attempts,
                    err.reason()
                );
                LaunchOutcome::Failed {
                    reason: err.reason(),
                    attempts: err.attempts,
                }
            }
        }
    }
}
