//! StrKey text forms for Stellar account ids (`G...`) and secret seeds (`S...`).
//!
//! Thin wrappers over `stellar-strkey` that map decode failures into
//! [`X402Error`] and keep secret seeds out of error messages.

use stellar_strkey::ed25519::{PrivateKey, PublicKey};

use crate::error::X402Error;

/// Decode a `G...` account id into its raw ed25519 public key.
pub fn decode_account_id(account_id: &str) -> Result<[u8; 32], X402Error> {
    PublicKey::from_string(account_id)
        .map(|key| key.0)
        .map_err(|_| X402Error::InvalidAddress(format!("{account_id}: not a valid account id")))
}

/// Encode a raw ed25519 public key as a `G...` account id.
pub fn encode_account_id(key: &[u8; 32]) -> String {
    PublicKey(*key).to_string()
}

/// Decode an `S...` secret seed. The seed itself is never echoed in errors.
pub fn decode_secret_seed(seed: &str) -> Result<[u8; 32], X402Error> {
    PrivateKey::from_string(seed)
        .map(|key| key.0)
        .map_err(|_| X402Error::InvalidAddress("secret seed: not a valid seed".to_string()))
}

/// Encode a raw ed25519 seed as an `S...` secret.
pub fn encode_secret_seed(seed: &[u8; 32]) -> String {
    PrivateKey(*seed).to_string()
}

/// `true` if `account_id` is a well-formed `G...` account id.
pub fn is_valid_account_id(account_id: &str) -> bool {
    decode_account_id(account_id).is_ok()
}
