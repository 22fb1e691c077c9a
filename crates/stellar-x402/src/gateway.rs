//! Contracts for the two external capabilities the unlock flow drives.
//!
//! - [`WalletGateway`]: presence check, account address, transaction signing
//! - [`LedgerGateway`]: account state, fee quotes, optional submission
//!
//! Wallets answer in several shapes (bare strings or structured objects).
//! [`AddressResponse`] and [`SignResponse`] normalize those at the boundary so
//! the state machine only ever sees `Option<String>` / `Option<SignedPayload>`.

use serde::{Deserialize, Serialize};

use crate::error::X402Error;
use crate::transaction::AccountSnapshot;

/// Signing request handed to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// Unsigned envelope, base64 XDR.
    pub encoded_transaction: String,
    /// Network name, e.g. `TESTNET`.
    pub network: String,
    pub network_passphrase: String,
}

/// Opaque signed envelope returned by a wallet. Never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedPayload(String);

impl SignedPayload {
    pub fn new(xdr: impl Into<String>) -> Self {
        Self(xdr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SignedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignedPayload({} bytes)", self.0.len())
    }
}

/// Result of submitting a signed envelope to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
    #[serde(default)]
    pub ledger: Option<u32>,
    pub successful: bool,
}

/// Wallet capability: detect, identify, sign.
pub trait WalletGateway: Send + Sync {
    /// Whether a wallet is installed/reachable. Must not block indefinitely.
    fn is_present(&self) -> impl std::future::Future<Output = Result<bool, X402Error>> + Send;

    /// The wallet's account id, or `None` if the user declined access.
    fn address(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, X402Error>> + Send;

    /// Ask the wallet to sign. `Ok(None)` means the user rejected the request;
    /// `Err` is a transport failure.
    fn sign(
        &self,
        request: &SignRequest,
    ) -> impl std::future::Future<Output = Result<Option<SignedPayload>, X402Error>> + Send;
}

/// Ledger capability: read account state and fees, optionally accept a
/// signed envelope.
pub trait LedgerGateway: Send + Sync {
    /// Load the account; fails if the account does not exist on the ledger.
    fn load_account(
        &self,
        account_id: &str,
    ) -> impl std::future::Future<Output = Result<AccountSnapshot, X402Error>> + Send;

    /// Current network base fee, in stroops per operation.
    fn fetch_base_fee(&self) -> impl std::future::Future<Output = Result<u32, X402Error>> + Send;

    /// Submit a signed envelope. Only called when submission is enabled in
    /// [`UnlockConfig`](crate::constants::UnlockConfig).
    fn submit_transaction(
        &self,
        _signed: &SignedPayload,
    ) -> impl std::future::Future<Output = Result<SubmitResponse, X402Error>> + Send {
        async {
            Err(X402Error::Ledger(
                "transaction submission not supported by this ledger gateway".to_string(),
            ))
        }
    }
}

/// Address answer from a wallet: either a bare account id or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddressResponse {
    Plain(String),
    Structured {
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl AddressResponse {
    /// Collapse into a usable address. Empty strings and error objects are `None`.
    pub fn into_address(self) -> Option<String> {
        let address = match self {
            AddressResponse::Plain(address) => Some(address),
            AddressResponse::Structured { error: Some(_), .. } => None,
            AddressResponse::Structured { address, .. } => address,
        };
        address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    }
}

/// Signing answer from a wallet: a bare envelope string or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignResponse {
    Plain(String),
    Structured {
        #[serde(default, rename = "signedTxXdr")]
        signed_tx_xdr: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl SignResponse {
    /// Collapse into a signed payload. Declines and empty answers are `None`.
    pub fn into_signed(self) -> Option<SignedPayload> {
        let xdr = match self {
            SignResponse::Plain(xdr) => Some(xdr),
            SignResponse::Structured { error: Some(_), .. } => None,
            SignResponse::Structured { signed_tx_xdr, .. } => signed_tx_xdr,
        };
        xdr.filter(|x| !x.trim().is_empty()).map(SignedPayload::new)
    }
}
