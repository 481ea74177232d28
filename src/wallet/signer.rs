//! Funding Signer
//!
//! The treasury's signing capability. The orchestrator builds the funding
//! transaction and sets its blockhash; the signer is the only component
//! that touches the funding account's secret key.

use std::fs;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

/// Signing seam for the funding account
#[async_trait]
pub trait FundingSigner: Send + Sync {
    /// Public key of the funding account.
    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction` with the funding key. The recent blockhash must
    /// already be set on the message.
    async fn sign(&self, transaction: Transaction) -> anyhow::Result<Transaction>;
}

/// Signer backed by an in-process keypair
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    /// Load the standard Solana keypair file (a JSON array of 64 bytes).
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let bytes: Vec<u8> = serde_json::from_str(&content)?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| anyhow::anyhow!("invalid keypair file {}: {}", path, e))?;
        Ok(Self { keypair })
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl FundingSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign(&self, mut transaction: Transaction) -> anyhow::Result<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_sign(&[&self.keypair], blockhash)?;
        Ok(transaction)
    }
}
