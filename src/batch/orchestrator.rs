//! Batch Orchestrator Module
//!
//! This module implements the state machine that takes one batch from
//! request to persisted result:
//!
//! 1. Validating: shape checks on the request
//! 2. Generating: size precheck, then fresh wallet keypairs
//! 3. Funding: treasury balance check, one multi-transfer transaction,
//!    sign via the external signer, submit and confirm
//! 4. Confirming: settle delay before trusting wallet balances
//! 5. Launching: strictly sequential, paced, per-wallet creation calls
//! 6. Finalized: assemble the result and hand it to the store
//!
//! Failures before launching abort the whole batch (`Aborted`); nothing is
//! persisted. Once launching begins the batch always finalizes, however
//! many wallets fail, and the result is persisted with per-wallet outcomes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::batch::tracker::{BatchPhase, BatchTracker, ProgressUpdate};
use crate::chain::ChainGateway;
use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::launch::LaunchInvoker;
use crate::store::ResultStore;
use crate::types::{BatchRequest, BatchResult, LaunchOutcome, WalletSlot};
use crate::validation::Validator;
use crate::wallet::{self, FundingSigner};

/// Failure reason recorded on wallets skipped by a cancellation.
pub(crate) const CANCELLED_REASON: &str = "cancelled before launch";

/// Failure reason recorded on wallets past the batch wall-clock ceiling.
pub(crate) const DEADLINE_REASON: &str = "batch deadline exceeded";

/// Batch orchestrator
///
/// Holds only shared handles; per-batch state lives on the stack of `run`,
/// so independent batches can run concurrently on the same instance.
pub struct BatchOrchestrator {
    /// Chain RPC wrapper (balances, fee context, submission)
    gateway: Arc<dyn ChainGateway>,
    /// Treasury signing capability; the orchestrator never sees the key
    signer: Arc<dyn FundingSigner>,
    /// Per-wallet creation driver with bounded retry
    invoker: LaunchInvoker,
    /// Persistence for finalized batches
    store: Arc<dyn ResultStore>,
    /// Request shape checks
    validator: Validator,
    /// Progress registry shared with the API layer
    tracker: BatchTracker,
    /// Pipeline configuration (limits, pacing, delays)
    config: BatchConfig,
    /// Whether generated secret keys are written into stored documents
    persist_secret_keys: bool,
}

impl BatchOrchestrator {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        signer: Arc<dyn FundingSigner>,
        invoker: LaunchInvoker,
        store: Arc<dyn ResultStore>,
        tracker: BatchTracker,
        config: BatchConfig,
        persist_secret_keys: bool,
    ) -> Self {
        let validator = Validator::new(&config);
        Self {
            gateway,
            signer,
            invoker,
            store,
            validator,
            tracker,
            config,
            persist_secret_keys,
        }
    }

    /// Public key of the treasury this orchestrator funds batches from.
    pub fn funding_account(&self) -> solana_sdk::pubkey::Pubkey {
        self.signer.pubkey()
    }

    /// Validate a request, register it, and run it in the background
    ///
    /// # Returns
    /// The new batch's request id as soon as validation passes. The batch
    /// itself proceeds on its own task and reports through the tracker and
    /// the result store.
    pub async fn submit(self: &Arc<Self>, request: BatchRequest) -> Result<Uuid, BatchError> {
        self.validator.validate(&request)?;

        let request_id = Uuid::new_v4();
        let cancel = self.tracker.register(request_id, request.wallet_count).await;
        info!(
            "batch {} accepted: {} wallets, {} lamports each",
            request_id, request.wallet_count, request.amount_per_wallet
        );

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = orchestrator.run(request_id, request, cancel).await {
                error!("batch {} aborted: {}", request_id, err);
            }
        });

        Ok(request_id)
    }

    /// Drive one batch through the full state machine
    ///
    /// # Returns
    /// The assembled `BatchResult` once the batch finalizes (even when some
    /// or all wallets failed to launch), or the abort reason when the batch
    /// never reached launching. Nothing is persisted on abort.
    pub async fn run(
        &self,
        request_id: Uuid,
        request: BatchRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BatchResult, BatchError> {
        let started = Instant::now();

        // Validating: shape checks plus the treasury identity check.
        self.tracker.set_phase(request_id, BatchPhase::Validating).await;
        if let Err(err) = self.validator.validate(&request) {
            return self.abort(request_id, err).await;
        }
        if request.funding_account != self.signer.pubkey() {
            let err = BatchError::InvalidRequest(
                "funding account does not match the configured signer".to_string(),
            );
            return self.abort(request_id, err).await;
        }

        // Generating: the funding transfers must fit one transaction.
        self.tracker.set_phase(request_id, BatchPhase::Generating).await;
        if let Err(err) = wallet::check_funding_transaction_size(request.wallet_count) {
            return self.abort(request_id, err).await;
        }
        let mut slots = wallet::generate(request.wallet_count);
        info!("batch {}: generated {} wallet pairs", request_id, slots.len());

        // Funding: balance check, build, sign, submit, confirm.
        self.tracker.set_phase(request_id, BatchPhase::Funding).await;
        if let Err(err) = self.fund(request_id, &request, &mut slots, &cancel).await {
            return self.abort(request_id, err).await;
        }

        // Confirming: let the transferred balances propagate before they
        // are read back. Funds have moved; from here on cancellation only
        // shortens the batch, it cannot abort it.
        self.tracker.set_phase(request_id, BatchPhase::Confirming).await;
        let settle = effective_delay(self.config.settle_delay_ms, self.config.settle_delay_floor_ms);
        wait_or_cancel(Duration::from_millis(settle), &mut cancel).await;

        // Launching: strictly sequential, paced, isolated per wallet.
        self.tracker.set_phase(request_id, BatchPhase::Launching).await;
        self.launch_all(request_id, &request, &mut slots, &mut cancel, started)
            .await;

        // Finalized: every wallet now has a terminal outcome.
        let result = self.assemble(request_id, &request, &slots);
        self.tracker.set_phase(request_id, BatchPhase::Finalized).await;
        info!(
            "batch {} finalized: {} succeeded, {} failed",
            request_id,
            result.succeeded_count(),
            result.failed_count()
        );

        // A store failure does not undo a finalized batch; the result is
        // still returned and the failure stays visible in the progress
        // state.
        if let Err(err) = self.store.save(&result).await {
            error!("batch {}: result could not be stored: {}", request_id, err);
            self.tracker
                .set_error(request_id, format!("store failure: {}", err))
                .await;
        }

        Ok(result)
    }

    async fn abort(&self, request_id: Uuid, err: BatchError) -> Result<BatchResult, BatchError> {
        warn!("batch {} aborted: {}", request_id, err);
        self.tracker.set_error(request_id, err.to_string()).await;
        self.tracker.set_phase(request_id, BatchPhase::Aborted).await;
        Err(err)
    }

    /// Fund every slot from the treasury in one transaction.
    async fn fund(
        &self,
        request_id: Uuid,
        request: &BatchRequest,
        slots: &mut [WalletSlot],
        cancel: &watch::Receiver<bool>,
    ) -> Result<(), BatchError> {
        let funding_account = request.funding_account;

        // Step 1: the treasury must cover the whole batch before anything
        // is built or submitted.
        let required = request
            .amount_per_wallet
            .checked_mul(request.wallet_count as u64)
            .ok_or_else(|| BatchError::FundingFailed {
                reason: "total funding amount overflows".to_string(),
            })?;
        let available = self
            .gateway
            .balance(&funding_account)
            .await
            .map_err(|e| BatchError::FundingFailed {
                reason: format!("treasury balance query failed: {}", e),
            })?;
        if available < required {
            return Err(BatchError::FundingFailed {
                reason: format!(
                    "funding account holds {} lamports, batch needs {}",
                    available, required
                ),
            });
        }

        if is_cancelled(cancel) {
            return Err(BatchError::Cancelled);
        }

        // Step 2: build the transaction and stamp it with a fresh fee
        // context.
        let mut transaction =
            wallet::build_funding_transaction(&funding_account, slots, request.amount_per_wallet);
        let context = self
            .gateway
            .fee_context()
            .await
            .map_err(|e| BatchError::FundingFailed {
                reason: format!("fee context unavailable: {}", e),
            })?;
        transaction.message.recent_blockhash = context.blockhash;

        // Step 3: the signer collaborator holds the treasury key.
        let signed = self
            .signer
            .sign(transaction)
            .await
            .map_err(|e| BatchError::FundingFailed {
                reason: format!("signing failed: {}", e),
            })?;

        // Last cancellation point before funds move.
        if is_cancelled(cancel) {
            return Err(BatchError::Cancelled);
        }

        // Step 4: submit and wait for confirmation.
        let signature = self
            .gateway
            .submit_and_confirm(&signed, &context)
            .await
            .map_err(|e| BatchError::FundingFailed { reason: e.to_string() })?;
        info!(
            "batch {}: funding transaction {} confirmed",
            request_id, signature
        );

        for slot in slots.iter_mut() {
            slot.funded_amount = request.amount_per_wallet;
            slot.funding_signature = Some(signature);
        }
        Ok(())
    }

    /// Launch wallets in index order, one at a time.
    async fn launch_all(
        &self,
        request_id: Uuid,
        request: &BatchRequest,
        slots: &mut [WalletSlot],
        cancel: &mut watch::Receiver<bool>,
        started: Instant,
    ) {
        let total = slots.len() as u32;
        let delay = Duration::from_millis(effective_delay(
            request.inter_wallet_delay_ms,
            self.config.inter_wallet_delay_floor_ms,
        ));
        let deadline = (self.config.max_duration_ms > 0)
            .then(|| Duration::from_millis(self.config.max_duration_ms));

        for (i, slot) in slots.iter_mut().enumerate() {
            let position = i as u32 + 1;

            // Cancellation and the wall-clock ceiling are checked at
            // wallet boundaries, never mid-attempt; outcomes already
            // recorded stay as they are.
            if is_cancelled(cancel) {
                warn!(
                    "batch {}: wallet {}/{} skipped, batch cancelled",
                    request_id, position, total
                );
                slot.complete(LaunchOutcome::Failed {
                    reason: CANCELLED_REASON.to_string(),
                    attempts: 0,
                });
                self.tracker
                    .record_progress(request_id, ProgressUpdate { current: position, total })
                    .await;
                continue;
            }
            if deadline.is_some_and(|d| started.elapsed() > d) {
                warn!(
                    "batch {}: wallet {}/{} skipped, wall-clock ceiling reached",
                    request_id, position, total
                );
                slot.complete(LaunchOutcome::Failed {
                    reason: DEADLINE_REASON.to_string(),
                    attempts: 0,
                });
                self.tracker
                    .record_progress(request_id, ProgressUpdate { current: position, total })
                    .await;
                continue;
            }

            // Best-effort balance read; a failure leaves the confirmed
            // balance unset and the launch still proceeds.
            match self.gateway.balance(&slot.spend_pubkey()).await {
                Ok(lamports) => slot.confirmed_balance = Some(lamports),
                Err(err) => warn!(
                    "batch {}: balance check for wallet {}/{} failed: {}",
                    request_id, position, total, err
                ),
            }

            let outcome = self.invoker.launch(slot, &request.metadata).await;
            slot.complete(outcome);
            self.tracker
                .record_progress(request_id, ProgressUpdate { current: position, total })
                .await;
            info!("batch {}: wallet {}/{} done", request_id, position, total);

            if position < total {
                wait_or_cancel(delay, cancel).await;
            }
        }
    }

    fn assemble(&self, request_id: Uuid, request: &BatchRequest, slots: &[WalletSlot]) -> BatchResult {
        let wallets = slots
            .iter()
            .map(|slot| slot.to_record(self.persist_secret_keys))
            .collect();

        BatchResult {
            request_id,
            metadata: request.metadata.clone(),
            funding_account: request.funding_account.to_string(),
            amount_per_wallet: request.amount_per_wallet,
            inter_wallet_delay_ms: effective_delay(
                request.inter_wallet_delay_ms,
                self.config.inter_wallet_delay_floor_ms,
            ),
            wallets,
            created_at: Utc::now(),
        }
    }
}

/// A requested or configured delay never drops below its floor.
pub(crate) fn effective_delay(requested_ms: u64, floor_ms: u64) -> u64 {
    requested_ms.max(floor_ms)
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Sleep that wakes early when the batch is cancelled.
async fn wait_or_cancel(duration: Duration, cancel: &mut watch::Receiver<bool>) {
    if is_cancelled(cancel) {
        return;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = cancel.changed() => {}
    }
}
