use std::time::Duration;

use crate::error::X402Error;

/// Passphrase of the Stellar test network.
pub const NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Network name passed to wallets alongside the passphrase.
pub const NETWORK_NAME: &str = "TESTNET";

/// Account that receives every unlock payment.
pub const DESTINATION: &str = "GC63PSERYMUUUJKYSSFQ7FKRAU5UPIP3XUC6X7DLMZUB7SSCPW5BSIRT";

/// Unlock price in XLM.
pub const PAYMENT_AMOUNT: &str = "1";

/// Native asset code, used for display only.
pub const NATIVE_ASSET_CODE: &str = "XLM";

/// XLM has 7 decimal places (1 XLM = 10^7 stroops).
pub const NATIVE_DECIMALS: u32 = 7;

/// Seconds after construction during which a payment transaction stays valid.
pub const TX_TIMEOUT_SECS: u64 = 30;

/// Settling delay between a successful signature and the unlocked phase.
pub const CONFIRMATION_DELAY_MS: u64 = 1000;

/// Default Horizon endpoint for the test network.
pub const HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

/// Resource revealed once the session is unlocked.
pub const RESOURCE_URL: &str = "https://www.x402stellar.xyz/";

/// Runtime configuration for an unlock session.
///
/// `Default` yields the fixed testnet constants. Only the endpoint, resource,
/// confirmation delay and submission switch are read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockConfig {
    pub network_name: String,
    pub network_passphrase: String,
    pub destination: String,
    pub amount: String,
    pub tx_timeout_secs: u64,
    pub confirmation_delay: Duration,
    pub horizon_url: String,
    pub resource_url: String,
    /// Submit the signed envelope to the ledger before unlocking.
    pub submit: bool,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            network_name: NETWORK_NAME.to_string(),
            network_passphrase: NETWORK_PASSPHRASE.to_string(),
            destination: DESTINATION.to_string(),
            amount: PAYMENT_AMOUNT.to_string(),
            tx_timeout_secs: TX_TIMEOUT_SECS,
            confirmation_delay: Duration::from_millis(CONFIRMATION_DELAY_MS),
            horizon_url: HORIZON_URL.to_string(),
            resource_url: RESOURCE_URL.to_string(),
            submit: false,
        }
    }
}

impl UnlockConfig {
    /// Load overrides from environment variables on top of the defaults.
    ///
    /// - `HORIZON_URL`: ledger endpoint
    /// - `X402_RESOURCE_URL`: protected resource
    /// - `X402_CONFIRM_DELAY_MS`: settling delay in milliseconds
    /// - `X402_SUBMIT`: `true`/`1` submits the signed envelope to Horizon
    pub fn from_env() -> Result<Self, X402Error> {
        let mut config = Self::default();

        if let Some(url) = non_empty_var("HORIZON_URL") {
            config.horizon_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = non_empty_var("X402_RESOURCE_URL") {
            config.resource_url = url;
        }

        if let Some(ms) = non_empty_var("X402_CONFIRM_DELAY_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                X402Error::Config(format!("invalid X402_CONFIRM_DELAY_MS '{ms}': {e}"))
            })?;
            config.confirmation_delay = Duration::from_millis(ms);
        }

        config.submit = non_empty_var("X402_SUBMIT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}
