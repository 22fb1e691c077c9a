//! Local-key wallet for x402 unlock payments.
//!
//! Holds an ed25519 secret seed and answers the [`WalletGateway`] contract
//! without a browser extension: it is always present, always shares its
//! account id, and signs unsigned envelopes for its own account. An optional
//! approval callback stands in for the user's confirm/decline prompt.

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use x402::xdr;
use x402::{strkey, SignRequest, SignedPayload, WalletGateway, X402Error};

type Approval = Arc<dyn Fn(&SignRequest) -> bool + Send + Sync>;

/// Generate a random secret seed and return it in `S...` form.
pub fn generate_secret_seed() -> Result<String, X402Error> {
    let mut seed = [0u8; 32];
    getrandom::fill(&mut seed)
        .map_err(|e| X402Error::Wallet(format!("random generation failed: {e}")))?;
    Ok(strkey::encode_secret_seed(&seed))
}

/// A wallet backed by a secret seed held in memory.
#[derive(Clone)]
pub struct LocalKeyWallet {
    signing_key: SigningKey,
    approval: Option<Approval>,
}

impl std::fmt::Debug for LocalKeyWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyWallet")
            .field("account_id", &self.account_id())
            .field("approval", &self.approval.is_some())
            .finish()
    }
}

impl LocalKeyWallet {
    /// Create a wallet from an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, X402Error> {
        let seed = strkey::decode_secret_seed(secret.trim())?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
            approval: None,
        })
    }

    /// Generate a new random keypair.
    pub fn random() -> Result<Self, X402Error> {
        Self::from_secret(&generate_secret_seed()?)
    }

    /// Ask `approve` before every signature; returning `false` declines.
    ///
    /// The callback runs on the blocking thread pool, so it may block on
    /// terminal input.
    pub fn with_approval(
        mut self,
        approve: impl Fn(&SignRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.approval = Some(Arc::new(approve));
        self
    }

    /// The wallet's `G...` account id.
    pub fn account_id(&self) -> String {
        strkey::encode_account_id(self.signing_key.verifying_key().as_bytes())
    }

    /// The `S...` secret seed, for export.
    pub fn secret_seed(&self) -> String {
        strkey::encode_secret_seed(&self.signing_key.to_bytes())
    }

    /// Sign an unsigned base64 envelope for `network_passphrase` and return
    /// the signed envelope.
    ///
    /// The envelope must be sourced from this wallet's account.
    pub fn sign_envelope(
        &self,
        encoded: &str,
        network_passphrase: &str,
    ) -> Result<SignedPayload, X402Error> {
        let tx = xdr::decode_unsigned(encoded)?;

        let public_key = self.signing_key.verifying_key().to_bytes();
        if xdr::source_key(&tx)? != public_key {
            return Err(X402Error::Wallet(
                "transaction source does not match wallet account".to_string(),
            ));
        }

        let hash = xdr::payload_hash(&tx, network_passphrase)?;
        let signature = self.signing_key.sign(&hash);
        tracing::debug!(hash = %hex::encode(hash), "signed transaction");

        let decorated = xdr::decorated_signature(&public_key, signature.to_bytes())?;
        xdr::envelope_base64(tx, vec![decorated]).map(SignedPayload::new)
    }
}

impl WalletGateway for LocalKeyWallet {
    async fn is_present(&self) -> Result<bool, X402Error> {
        Ok(true)
    }

    async fn address(&self) -> Result<Option<String>, X402Error> {
        Ok(Some(self.account_id()))
    }

    async fn sign(&self, request: &SignRequest) -> Result<Option<SignedPayload>, X402Error> {
        if let Some(approve) = &self.approval {
            let approve = approve.clone();
            let pending = request.clone();
            let approved = tokio::task::spawn_blocking(move || approve(&pending))
                .await
                .map_err(|e| X402Error::Wallet(format!("approval prompt failed: {e}")))?;
            if !approved {
                tracing::info!("signature request declined");
                return Ok(None);
            }
        }
        self.sign_envelope(&request.encoded_transaction, &request.network_passphrase)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};
    use stellar_xdr::curr::{Limits, ReadXdr, TransactionEnvelope};
    use x402::{
        AccountSnapshot, PaymentIntent, TransactionBuilder, UnlockConfig, NETWORK_PASSPHRASE,
    };

    const SEED: &str = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";
    const ACCOUNT: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";

    fn unsigned_for(account_id: &str) -> (x402::Transaction, String) {
        let account = AccountSnapshot {
            account_id: account_id.to_string(),
            sequence: 99,
        };
        let intent = PaymentIntent::new(&UnlockConfig::default(), account, 100).unwrap();
        let tx = TransactionBuilder::build(&intent, 1_700_000_000).unwrap();
        let encoded = tx.to_xdr_base64().unwrap();
        (tx, encoded)
    }

    fn request(encoded: String) -> SignRequest {
        SignRequest {
            encoded_transaction: encoded,
            network: "TESTNET".to_string(),
            network_passphrase: NETWORK_PASSPHRASE.to_string(),
        }
    }

    #[test]
    fn test_account_from_known_seed() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        assert_eq!(wallet.account_id(), ACCOUNT);
        assert_eq!(wallet.secret_seed(), SEED);
    }

    #[test]
    fn test_random_wallets_differ() {
        let a = LocalKeyWallet::random().unwrap();
        let b = LocalKeyWallet::random().unwrap();
        assert_ne!(a.account_id(), b.account_id());
        assert!(strkey::is_valid_account_id(&a.account_id()));
    }

    #[test]
    fn test_rejects_account_id_as_secret() {
        assert!(LocalKeyWallet::from_secret(ACCOUNT).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        let debug = format!("{wallet:?}");
        assert!(debug.contains(ACCOUNT));
        assert!(!debug.contains(SEED));
    }

    #[test]
    fn test_signature_verifies_against_transaction_hash() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        let (tx, encoded) = unsigned_for(ACCOUNT);

        let signed = wallet.sign_envelope(&encoded, NETWORK_PASSPHRASE).unwrap();
        let envelope =
            TransactionEnvelope::from_xdr_base64(signed.as_str(), Limits::none()).unwrap();
        let TransactionEnvelope::Tx(v1) = envelope else {
            panic!("expected a v1 envelope");
        };

        assert_eq!(v1.tx, xdr::to_xdr_transaction(&tx).unwrap());
        assert_eq!(v1.signatures.len(), 1);
        let public_key = wallet.signing_key.verifying_key();
        assert_eq!(&v1.signatures[0].hint.0[..], &public_key.as_bytes()[28..]);

        let raw: Vec<u8> = v1.signatures[0].signature.0.clone().into();
        let signature = Signature::from_slice(&raw).unwrap();
        let hash = tx.hash(NETWORK_PASSPHRASE).unwrap();
        public_key.verify(&hash, &signature).unwrap();
    }

    #[test]
    fn test_signature_is_network_scoped() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        let (_, encoded) = unsigned_for(ACCOUNT);
        let testnet = wallet.sign_envelope(&encoded, NETWORK_PASSPHRASE).unwrap();
        let public = wallet
            .sign_envelope(&encoded, "Public Global Stellar Network ; September 2015")
            .unwrap();
        assert_ne!(testnet, public);
    }

    #[test]
    fn test_refuses_foreign_source_account() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        let (_, encoded) = unsigned_for(x402::DESTINATION);
        let err = wallet
            .sign_envelope(&encoded, NETWORK_PASSPHRASE)
            .unwrap_err();
        assert!(matches!(err, X402Error::Wallet(_)));
    }

    #[tokio::test]
    async fn test_gateway_contract() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        assert!(wallet.is_present().await.unwrap());
        assert_eq!(wallet.address().await.unwrap().as_deref(), Some(ACCOUNT));

        let (_, encoded) = unsigned_for(ACCOUNT);
        assert!(wallet.sign(&request(encoded)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_declined_approval_returns_none() {
        let wallet = LocalKeyWallet::from_secret(SEED)
            .unwrap()
            .with_approval(|req| req.network == "PUBLIC");
        let (_, encoded) = unsigned_for(ACCOUNT);
        assert!(wallet.sign(&request(encoded)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approval_runs_off_the_async_thread() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let record = seen.clone();
        let wallet = LocalKeyWallet::from_secret(SEED)
            .unwrap()
            .with_approval(move |_| {
                *record.lock().unwrap() = Some(std::thread::current().id());
                true
            });

        let (_, encoded) = unsigned_for(ACCOUNT);
        assert!(wallet.sign(&request(encoded)).await.unwrap().is_some());

        let approver = seen.lock().unwrap().expect("approval was asked");
        assert_ne!(approver, std::thread::current().id());
    }

    #[tokio::test]
    async fn test_garbage_envelope_is_error() {
        let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
        let err = wallet.sign(&request("!!".to_string())).await.unwrap_err();
        assert!(matches!(err, X402Error::Encoding(_)));
    }
}
