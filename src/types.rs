use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use uuid::Uuid;

/// Token metadata attached to a batch request
///
/// Only `name` and `symbol` are required; the description defaults to empty
/// and the image reference plus social links are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
}

/// A request to generate, fund, and launch a batch of wallets
///
/// `funding_account` is filled in from the configured signer by the transport
/// layer; callers never choose an arbitrary treasury. Amounts are lamports.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub wallet_count: u32,
    pub amount_per_wallet: u64,
    pub inter_wallet_delay_ms: u64,
    pub metadata: TokenMetadata,
    pub funding_account: Pubkey,
}

/// Terminal/pending launch state of one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LaunchOutcome {
    Pending,
    #[serde(rename_all = "camelCase")]
    Succeeded { token_url: String },
    Failed { reason: String, attempts: u32 },
}

impl LaunchOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LaunchOutcome::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Succeeded { .. })
    }
}

/// One generated wallet inside a batch
///
/// Owns both keypairs for the lifetime of the batch: the spend key holds the
/// funded lamports, the asset key identifies the token to be created. The
/// launch outcome starts `Pending` and moves at most once to a terminal
/// state; `complete` ignores any attempt to move it again.
pub struct WalletSlot {
    pub index: u32,
    pub spend_keypair: Keypair,
    pub asset_keypair: Keypair,
    pub funded_amount: u64,
    pub funding_signature: Option<Signature>,
    pub confirmed_balance: Option<u64>,
    outcome: LaunchOutcome,
}

impl WalletSlot {
    pub fn new(index: u32, spend_keypair: Keypair, asset_keypair: Keypair) -> Self {
        Self {
            index,
            spend_keypair,
            asset_keypair,
            funded_amount: 0,
            funding_signature: None,
            confirmed_balance: None,
            outcome: LaunchOutcome::Pending,
        }
    }

    pub fn spend_pubkey(&self) -> Pubkey {
        self.spend_keypair.pubkey()
    }

    pub fn asset_pubkey(&self) -> Pubkey {
        self.asset_keypair.pubkey()
    }

    pub fn outcome(&self) -> &LaunchOutcome {
        &self.outcome
    }

    /// Record the wallet's terminal outcome. Only the first terminal
    /// transition sticks; `Pending` is never written back.
    pub fn complete(&mut self, outcome: LaunchOutcome) {
        if matches!(self.outcome, LaunchOutcome::Pending) && outcome.is_terminal() {
            self.outcome = outcome;
        }
    }

    /// Serializable projection of this slot for the persisted batch document.
    ///
    /// Secret key material is copied out only when `persist_secret_keys` is
    /// set; public keys and the outcome are always included.
    pub fn to_record(&self, persist_secret_keys: bool) -> WalletRecord {
        WalletRecord {
            label: format!("Wallet {}", self.index + 1),
            spend_pubkey: self.spend_pubkey().to_string(),
            asset_pubkey: self.asset_pubkey().to_string(),
            spend_secret: persist_secret_keys.then(|| self.spend_keypair.to_base58_string()),
            asset_secret: persist_secret_keys.then(|| self.asset_keypair.to_base58_string()),
            funded_amount: self.funded_amount,
            funding_signature: self.funding_signature.map(|s| s.to_string()),
            confirmed_balance: self.confirmed_balance,
            outcome: self.outcome.clone(),
        }
    }
}

/// Persisted view of one wallet in a finalized batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub label: String,
    pub spend_pubkey: String,
    pub asset_pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_secret: Option<String>,
    pub funded_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_balance: Option<u64>,
    pub outcome: LaunchOutcome,
}

/// Aggregated result of one batch, stored as a single document
///
/// Wallets are embedded in index order rather than kept as a separate
/// collection; a batch is always read and written as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub metadata: TokenMetadata,
    pub funding_account: String,
    pub amount_per_wallet: u64,
    pub inter_wallet_delay_ms: u64,
    pub wallets: Vec<WalletRecord>,
    pub created_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn succeeded_count(&self) -> usize {
        self.wallets.iter().filter(|w| w.outcome.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.wallets.len() - self.succeeded_count()
    }
}
