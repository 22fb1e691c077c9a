//! Payment transaction construction.
//!
//! [`TransactionBuilder::build`] is a pure function of the intent and the
//! clock: same inputs, same transaction, apart from the time-bound window.

use serde::{Deserialize, Serialize};

use crate::amount::parse_native_amount;
use crate::constants::UnlockConfig;
use crate::error::X402Error;
use crate::strkey;
use crate::xdr;

/// Account state as loaded from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    /// Current (last used) sequence number of the account.
    pub sequence: i64,
}

/// Inclusive validity window in unix seconds. `0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// Native-asset payment operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOp {
    pub destination: String,
    /// Amount in stroops.
    pub amount: i64,
}

/// A single-operation payment transaction, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub source_account: String,
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: TimeBounds,
    pub payment: PaymentOp,
}

impl Transaction {
    /// Canonical encoding of the unsigned envelope (base64 XDR).
    pub fn to_xdr_base64(&self) -> Result<String, X402Error> {
        xdr::envelope_base64(xdr::to_xdr_transaction(self)?, Vec::new())
    }

    /// Network-scoped hash that signers sign.
    pub fn hash(&self, network_passphrase: &str) -> Result<[u8; 32], X402Error> {
        xdr::transaction_hash(self, network_passphrase)
    }
}

/// Everything needed to build one payment attempt. Built fresh per `pay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub destination: String,
    /// Amount in stroops.
    pub amount: i64,
    pub network_passphrase: String,
    pub fee: u32,
    pub timeout_secs: u64,
    pub source: AccountSnapshot,
}

impl PaymentIntent {
    /// Combine the fixed session configuration with freshly loaded ledger data.
    pub fn new(config: &UnlockConfig, source: AccountSnapshot, fee: u32) -> Result<Self, X402Error> {
        Ok(Self {
            destination: config.destination.clone(),
            amount: parse_native_amount(&config.amount)?,
            network_passphrase: config.network_passphrase.clone(),
            fee,
            timeout_secs: config.tx_timeout_secs,
            source,
        })
    }
}

pub struct TransactionBuilder;

impl TransactionBuilder {
    /// Build the payment transaction for `intent`, valid until `now + timeout`.
    ///
    /// Uses the account's next sequence number. The snapshot inside the
    /// intent is left untouched.
    pub fn build(intent: &PaymentIntent, now_secs: u64) -> Result<Transaction, X402Error> {
        if !strkey::is_valid_account_id(&intent.source.account_id) {
            return Err(X402Error::InvalidAddress(format!(
                "source account {}",
                intent.source.account_id
            )));
        }
        if !strkey::is_valid_account_id(&intent.destination) {
            return Err(X402Error::InvalidAddress(format!(
                "destination account {}",
                intent.destination
            )));
        }
        if intent.amount <= 0 {
            return Err(X402Error::InvalidAmount(format!(
                "amount must be positive, got {}",
                intent.amount
            )));
        }

        let sequence = intent.source.sequence.checked_add(1).ok_or_else(|| {
            X402Error::Ledger(format!(
                "sequence overflow for account {}",
                intent.source.account_id
            ))
        })?;

        let max_time = now_secs.checked_add(intent.timeout_secs).ok_or_else(|| {
            X402Error::Config(format!("timeout {}s overflows the clock", intent.timeout_secs))
        })?;

        Ok(Transaction {
            source_account: intent.source.account_id.clone(),
            fee: intent.fee,
            sequence,
            time_bounds: TimeBounds {
                min_time: 0,
                max_time,
            },
            payment: PaymentOp {
                destination: intent.destination.clone(),
                amount: intent.amount,
            },
        })
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> Result<u64, X402Error> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| X402Error::Config(format!("system time error: {e}")))
}
