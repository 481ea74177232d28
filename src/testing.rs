//! Testing Utilities
//!
//! Scriptable doubles for the pipeline's collaborator seams: the chain
//! gateway, the external creation service, and the result store. Used by
//! this crate's tests and available to downstream consumers for wiring an
//! orchestrator without a network.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::sync::{Mutex, RwLock};

use crate::chain::{ChainGateway, FeeContext};
use crate::error::{GatewayError, LaunchServiceError, StoreError};
use crate::launch::{LaunchReceipt, LaunchService};
use crate::store::ResultStore;
use crate::types::{BatchResult, TokenMetadata, WalletSlot};

/// Gateway double with scriptable results
///
/// Unscripted calls succeed: the fee context is a fixed placeholder, every
/// account holds `default_balance`, and submissions confirm immediately.
/// Push results to make specific calls fail, or pin a balance per account.
pub struct MockChainGateway {
    fee_results: Mutex<VecDeque<Result<FeeContext, GatewayError>>>,
    balances: Mutex<HashMap<Pubkey, Result<u64, GatewayError>>>,
    default_balance: Mutex<Result<u64, GatewayError>>,
    submit_results: Mutex<VecDeque<Result<(), GatewayError>>>,
    submitted: Mutex<Vec<Transaction>>,
}

impl MockChainGateway {
    pub fn new() -> Self {
        Self {
            fee_results: Mutex::new(VecDeque::new()),
            balances: Mutex::new(HashMap::new()),
            default_balance: Mutex::new(Ok(10_000_000_000)),
            submit_results: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Queue the result of the next fee-context fetch.
    pub async fn push_fee_result(&self, result: Result<FeeContext, GatewayError>) {
        self.fee_results.lock().await.push_back(result);
    }

    /// Pin the balance result for one account.
    pub async fn set_balance(&self, account: Pubkey, result: Result<u64, GatewayError>) {
        self.balances.lock().await.insert(account, result);
    }

    /// Set the balance result returned for accounts without a pinned one.
    pub async fn set_default_balance(&self, result: Result<u64, GatewayError>) {
        *self.default_balance.lock().await = result;
    }

    /// Queue the result of the next submission.
    pub async fn push_submit_result(&self, result: Result<(), GatewayError>) {
        self.submit_results.lock().await.push_back(result);
    }

    /// Number of transactions that reached submission.
    pub async fn submitted_count(&self) -> usize {
        self.submitted.lock().await.len()
    }
}

impl Default for MockChainGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainGateway for MockChainGateway {
    async fn fee_context(&self) -> Result<FeeContext, GatewayError> {
        match self.fee_results.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(FeeContext {
                blockhash: Hash::new_unique(),
                last_valid_block_height: 1_000,
            }),
        }
    }

    async fn balance(&self, account: &Pubkey) -> Result<u64, GatewayError> {
        match self.balances.lock().await.get(account) {
            Some(result) => result.clone(),
            None => self.default_balance.lock().await.clone(),
        }
    }

    async fn submit_and_confirm(
        &self,
        transaction: &Transaction,
        _context: &FeeContext,
    ) -> Result<Signature, GatewayError> {
        if let Some(Err(err)) = self.submit_results.lock().await.pop_front() {
            return Err(err);
        }
        self.submitted.lock().await.push(transaction.clone());
        Ok(transaction.signatures.first().copied().unwrap_or_default())
    }
}

/// Creation-service double with a scripted result queue
///
/// Scripted results are consumed in call order. With the queue empty, the
/// call fails when a standing failure is set, otherwise it succeeds with a
/// URL derived from the wallet's asset key.
pub struct MockLaunchService {
    token_url_base: String,
    scripted: Mutex<VecDeque<Result<LaunchReceipt, LaunchServiceError>>>,
    standing_failure: Mutex<Option<LaunchServiceError>>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<Pubkey>>,
}

impl MockLaunchService {
    pub fn new(token_url_base: &str) -> Self {
        Self {
            token_url_base: token_url_base.trim_end_matches('/').to_string(),
            scripted: Mutex::new(VecDeque::new()),
            standing_failure: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the result of the next creation call.
    pub async fn push(&self, result: Result<LaunchReceipt, LaunchServiceError>) {
        self.scripted.lock().await.push_back(result);
    }

    /// Fail every unscripted call with `err`.
    pub async fn fail_always(&self, err: LaunchServiceError) {
        *self.standing_failure.lock().await = Some(err);
    }

    /// Add a fixed latency to every creation call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = delay;
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Asset keys of every creation call, in call order.
    pub async fn calls(&self) -> Vec<Pubkey> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl LaunchService for MockLaunchService {
    async fn create(
        &self,
        wallet: &WalletSlot,
        _metadata: &TokenMetadata,
    ) -> Result<LaunchReceipt, LaunchServiceError> {
        let delay = *self.delay.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().await.push(wallet.asset_pubkey());

        if let Some(result) = self.scripted.lock().await.pop_front() {
            return result;
        }
        if let Some(err) = self.standing_failure.lock().await.clone() {
            return Err(err);
        }
        Ok(LaunchReceipt {
            token_url: format!("{}/{}", self.token_url_base, wallet.asset_pubkey()),
        })
    }
}

/// In-memory result store
pub struct MemoryResultStore {
    batches: RwLock<Vec<BatchResult>>,
    fail_saves: Mutex<bool>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self {
            batches: RwLock::new(Vec::new()),
            fail_saves: Mutex::new(false),
        }
    }

    /// Make every subsequent save fail.
    pub async fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().await = fail;
    }

    pub async fn stored_count(&self) -> usize {
        self.batches.read().await.len()
    }
}

impl Default for MemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, result: &BatchResult) -> Result<String, StoreError> {
        if *self.fail_saves.lock().await {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let mut batches = self.batches.write().await;
        batches.retain(|b| b.request_id != result.request_id);
        batches.push(result.clone());
        Ok(result.request_id.to_string())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BatchResult>, StoreError> {
        Ok(self
            .batches
            .read()
            .await
            .iter()
            .find(|b| b.request_id.to_string() == id)
            .cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<BatchResult>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .batches
            .read()
            .await
            .iter()
            .filter(|b| {
                b.metadata.name.to_lowercase().contains(&needle)
                    || b.metadata.symbol.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}
