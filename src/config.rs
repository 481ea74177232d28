//! Configuration Module
//!
//! This module defines all configuration structures for the launch service.
//! Configuration is loaded from TOML files and parsed using serde.

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Main configuration structure
///
/// Contains all configuration sections for the launch service.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [gateway]
/// rpc_url = "https://api.mainnet-beta.solana.com"
/// commitment = "confirmed"
///
/// [batch]
/// max_wallets = 20
/// inter_wallet_delay_floor_ms = 5000
///
/// [api]
/// host = "127.0.0.1"
/// port = 3000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub funding: FundingConfig,
    pub batch: BatchConfig,
    pub launch: LaunchConfig,
    pub api: ApiConfig,
    pub store: StoreConfig,
}

/// Chain gateway configuration
///
/// Controls the RPC connection and the time boxes around every remote call.
///
/// # Fields
/// - `rpc_url`: Solana RPC endpoint
/// - `commitment`: "processed", "confirmed", or "finalized"
/// - `request_timeout_ms`: time box applied to each individual RPC call
/// - `fee_context_attempts`: retry ceiling for the fee-context fetch
/// - `retry_delay_ms`: fixed delay between fee-context attempts
/// - `confirm_poll_interval_ms`: pause between confirmation status polls
/// - `max_confirm_poll_failures`: consecutive poll failures before the
///   gateway reports the endpoint unavailable
/// - `block_height_margin`: safety margin added to the network's
///   last-valid-block-height when building a fee context
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub rpc_url: String,
    pub commitment: String,
    pub request_timeout_ms: u64,
    pub fee_context_attempts: u32,
    pub retry_delay_ms: u64,
    pub confirm_poll_interval_ms: u64,
    pub max_confirm_poll_failures: u32,
    pub block_height_margin: u64,
}

impl GatewayConfig {
    /// Retry parameters for the fee-context fetch.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fee_context_attempts,
            attempt_timeout: Duration::from_millis(self.request_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Funding wallet configuration
///
/// # Fields
/// - `keypair_path`: path to the treasury keypair file (standard JSON
///   byte-array format)
#[derive(Debug, Clone, Deserialize)]
pub struct FundingConfig {
    pub keypair_path: String,
}

/// Batch pipeline configuration
///
/// # Fields
/// - `max_wallets`: upper bound on wallets per batch; must stay low enough
///   for the funding transfers to fit one transaction
/// - `inter_wallet_delay_floor_ms`: requested per-wallet pacing is clamped
///   up to this floor
/// - `settle_delay_ms`: wait after funding confirmation before trusting
///   wallet balances; clamped up to `settle_delay_floor_ms`
/// - `settle_delay_floor_ms`: lower bound on the settle delay, guarding
///   against a misconfigured zero wait
/// - `max_duration_ms`: wall-clock ceiling for one batch, checked between
///   wallets; 0 disables the ceiling
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub max_wallets: u32,
    pub inter_wallet_delay_floor_ms: u64,
    pub settle_delay_ms: u64,
    pub settle_delay_floor_ms: u64,
    pub max_duration_ms: u64,
}

/// External creation endpoint configuration
///
/// # Fields
/// - `endpoint`: URL of the token-creation service
/// - `token_url_base`: base used to derive a token URL when the service
///   omits one from a successful response
/// - `attempts`: per-wallet retry ceiling
/// - `attempt_timeout_ms`: time box applied to each creation attempt
/// - `retry_delay_ms`: fixed delay between attempts
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchConfig {
    pub endpoint: String,
    pub token_url_base: String,
    pub attempts: u32,
    pub attempt_timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl LaunchConfig {
    /// Retry parameters for one wallet's creation calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.attempts,
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 3000)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Result store configuration
///
/// # Fields
/// - `url`: SQLite connection URL (e.g., "sqlite://launchpad.db?mode=rwc")
/// - `persist_secret_keys`: when true, generated wallet secret keys are
///   written into the stored batch document; off by default
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub persist_secret_keys: bool,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    ///
    /// # Example
    /// ```no_run
    /// # use launchpad::config::Config;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::load("config/default.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Read the file contents as a string
        let content = fs::read_to_string(path)?;

        // Parse the TOML into our Config structure
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }
}
