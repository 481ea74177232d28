use tracing::{debug, warn};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::types::BatchRequest;

pub struct Validator {
    max_wallets: u32,
}

impl Validator {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            max_wallets: config.max_wallets,
        }
    }

    /// Validate a batch request
    /// Returns Ok(()) if valid, Err(BatchError::InvalidRequest) if not
    pub fn validate(&self, request: &BatchRequest) -> Result<(), BatchError> {
        debug!("validating batch request for {} wallets", request.wallet_count);

        // 1. Wallet count bounds
        self.check_wallet_count(request)?;

        // 2. Amount and total cost
        self.check_amounts(request)?;

        // 3. Token metadata presence
        self.check_metadata(request)?;

        debug!("batch request validation successful");
        Ok(())
    }

    fn check_wallet_count(&self, request: &BatchRequest) -> Result<(), BatchError> {
        if request.wallet_count == 0 {
            warn!("rejected batch request with zero wallets");
            return Err(BatchError::InvalidRequest(
                "wallet count must be at least 1".to_string(),
            ));
        }

        if request.wallet_count > self.max_wallets {
            warn!(
                "rejected batch request: {} wallets exceeds the limit of {}",
                request.wallet_count, self.max_wallets
            );
            return Err(BatchError::InvalidRequest(format!(
                "wallet count {} exceeds the limit of {}",
                request.wallet_count, self.max_wallets
            )));
        }

        Ok(())
    }

    fn check_amounts(&self, request: &BatchRequest) -> Result<(), BatchError> {
        if request.amount_per_wallet == 0 {
            return Err(BatchError::InvalidRequest(
                "amount per wallet must be positive".to_string(),
            ));
        }

        // The total funding cost must stay representable.
        if request
            .amount_per_wallet
            .checked_mul(request.wallet_count as u64)
            .is_none()
        {
            return Err(BatchError::InvalidRequest(
                "total funding amount overflows".to_string(),
            ));
        }

        Ok(())
    }

    fn check_metadata(&self, request: &BatchRequest) -> Result<(), BatchError> {
        if request.metadata.name.trim().is_empty() {
            return Err(BatchError::InvalidRequest("token name is required".to_string()));
        }

        if request.metadata.symbol.trim().is_empty() {
            return Err(BatchError::InvalidRequest(
                "token symbol is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenMetadata;
    use solana_sdk::pubkey::Pubkey;

    fn validator() -> Validator {
        Validator::new(&BatchConfig {
            max_wallets: 20,
            inter_wallet_delay_floor_ms: 5_000,
            settle_delay_ms: 5_000,
            settle_delay_floor_ms: 2_000,
            max_duration_ms: 0,
        })
    }

    fn valid_request() -> BatchRequest {
        BatchRequest {
            wallet_count: 3,
            amount_per_wallet: 35_000_000,
            inter_wallet_delay_ms: 5_000,
            metadata: TokenMetadata {
                name: "Example Token".to_string(),
                symbol: "XMPL".to_string(),
                description: String::new(),
                image_ref: None,
                twitter: None,
                website: None,
                telegram: None,
            },
            funding_account: Pubkey::new_unique(),
        }
    }

    #[test]
    fn accepts_a_valid_request() {
        assert!(validator().validate(&valid_request()).is_ok());
    }

    #[test]
    fn rejects_zero_wallets() {
        let mut request = valid_request();
        request.wallet_count = 0;
        assert!(matches!(
            validator().validate(&request),
            Err(BatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_counts_over_the_limit() {
        let mut request = valid_request();
        request.wallet_count = 21;
        assert!(matches!(
            validator().validate(&request),
            Err(BatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_zero_amount() {
        let mut request = valid_request();
        request.amount_per_wallet = 0;
        assert!(matches!(
            validator().validate(&request),
            Err(BatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_total_amount_overflow() {
        let mut request = valid_request();
        request.wallet_count = 3;
        request.amount_per_wallet = u64::MAX;
        assert!(matches!(
            validator().validate(&request),
            Err(BatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_blank_metadata() {
        let mut request = valid_request();
        request.metadata.name = "   ".to_string();
        assert!(validator().validate(&request).is_err());

        let mut request = valid_request();
        request.metadata.symbol = String::new();
        assert!(validator().validate(&request).is_err());
    }

    #[test]
    fn low_pacing_is_not_rejected() {
        // Pacing below the floor is clamped at use, never rejected here.
        let mut request = valid_request();
        request.inter_wallet_delay_ms = 0;
        assert!(validator().validate(&request).is_ok());
    }
}
