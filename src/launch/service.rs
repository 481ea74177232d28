//! Launch Service
//!
//! The external creation capability behind a trait, plus the HTTP adapter
//! that speaks the creation endpoint's JSON contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LaunchConfig;
use crate::error::LaunchServiceError;
use crate::types::{TokenMetadata, WalletSlot};

/// Proof of a successful creation call
#[derive(Debug, Clone)]
pub struct LaunchReceipt {
    pub token_url: String,
}

/// External token-creation capability
///
/// Opaque beyond this contract: the wallet's keys and the token metadata go
/// in, a token URL comes out or the call fails.
#[async_trait]
pub trait LaunchService: Send + Sync {
    async fn create(
        &self,
        wallet: &WalletSlot,
        metadata: &TokenMetadata,
    ) -> Result<LaunchReceipt, LaunchServiceError>;
}

/// HTTP adapter for the remote creation endpoint
pub struct HttpLaunchService {
    client: reqwest::Client,
    endpoint: String,
    token_url_base: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletData {
    keypair: String,
    mint: String,
    public_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    wallet_data: WalletData,
    token_name: &'a str,
    token_symbol: &'a str,
    token_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    twitter_link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram_link: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    success: bool,
    #[serde(default)]
    token_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpLaunchService {
    pub fn new(config: &LaunchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            token_url_base: config.token_url_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LaunchService for HttpLaunchService {
    async fn create(
        &self,
        wallet: &WalletSlot,
        metadata: &TokenMetadata,
    ) -> Result<LaunchReceipt, LaunchServiceError> {
        let asset_pubkey = wallet.asset_pubkey().to_string();
        let body = CreateRequest {
            wallet_data: WalletData {
                keypair: wallet.spend_keypair.to_base58_string(),
                mint: wallet.asset_keypair.to_base58_string(),
                public_key: wallet.spend_pubkey().to_string(),
            },
            token_name: &metadata.name,
            token_symbol: &metadata.symbol,
            token_description: &metadata.description,
            image_ref: metadata.image_ref.as_deref(),
            twitter_link: metadata.twitter.as_deref(),
            website_link: metadata.website.as_deref(),
            telegram_link: metadata.telegram.as_deref(),
        };

        debug!("creating token {} for wallet {}", metadata.symbol, wallet.index);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| LaunchServiceError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let parsed: CreateResponse = response
            .json()
            .await
            .map_err(|e| LaunchServiceError::Transport(format!("invalid response body: {}", e)))?;

        if !parsed.success {
            let reason = parsed
                .error
                .unwrap_or_else(|| format!("creation endpoint returned {}", status));
            return Err(LaunchServiceError::Rejected(reason));
        }

        // A success without an explicit URL still identifies the token by
        // its asset key.
        let token_url = parsed
            .token_url
            .unwrap_or_else(|| format!("{}/{}", self.token_url_base, asset_pubkey));

        Ok(LaunchReceipt { token_url })
    }
}
