//! The unlock state machine.
//!
//! ```text
//! Locked ──connect──> Connected ──pay──> Paying ──signed──> Unlocked
//!   ^  └─(error)─┘        ^                 │                  │
//!   │                     └─────(error)─────┘                  │
//!   └──────────────────────────reset───────────────────────────┘
//! ```
//!
//! Every trigger runs as one async operation. The only suspension points are
//! gateway calls and the confirmation delay. State lives in a
//! [`tokio::sync::watch`] channel so a presentation layer can subscribe and
//! re-render on every change; each update is applied in a single
//! `send_modify`, so observers never see a half-applied transition.
//! Dropping a `connect` or `pay` future mid-flight restores the prior phase
//! and clears `busy`.

use tokio::sync::watch;
use tracing::instrument;

use crate::constants::UnlockConfig;
use crate::error::X402Error;
use crate::gateway::{LedgerGateway, SignRequest, SignedPayload, WalletGateway};
use crate::session::{redact_address, BusyLabel, ErrorCode, Phase, SessionState, TxFailure};
use crate::transaction::{unix_now, PaymentIntent, TransactionBuilder};

/// User-facing triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Connect,
    Pay,
    Reset,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trigger::Connect => "connect",
            Trigger::Pay => "pay",
            Trigger::Reset => "reset",
        };
        f.write_str(s)
    }
}

/// Outcome of a trigger that did not succeed.
///
/// `Busy` and `InvalidPhase` leave the session untouched. `Failed` carries the
/// code that was also recorded as the session's `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("{trigger} ignored: another operation is in flight")]
    Busy { trigger: Trigger },

    #[error("{trigger} is not available in phase {phase}")]
    InvalidPhase { trigger: Trigger, phase: Phase },

    #[error(transparent)]
    Failed(#[from] ErrorCode),
}

/// Drives one wallet through connect -> pay -> unlocked.
pub struct UnlockMachine<W: WalletGateway, L: LedgerGateway> {
    wallet: W,
    ledger: L,
    config: UnlockConfig,
    state: watch::Sender<SessionState>,
}

impl<W: WalletGateway, L: LedgerGateway> UnlockMachine<W, L> {
    /// Create a machine in the Locked phase with testnet defaults.
    pub fn new(wallet: W, ledger: L) -> Self {
        Self::with_config(wallet, ledger, UnlockConfig::default())
    }

    pub fn with_config(wallet: W, ledger: L, config: UnlockConfig) -> Self {
        let (state, _) = watch::channel(SessionState::new());
        Self {
            wallet,
            ledger,
            config,
            state,
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &UnlockConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The protected resource, available only once unlocked.
    pub fn resource_url(&self) -> Option<&str> {
        self.state
            .borrow()
            .is_unlocked()
            .then_some(self.config.resource_url.as_str())
    }

    /// Connect the wallet: presence check, then address retrieval.
    #[instrument(skip_all)]
    pub async fn connect(&self) -> Result<(), TriggerError> {
        self.claim(Trigger::Connect, |state| {
            if state.phase != Phase::Locked {
                return Err(TriggerError::InvalidPhase {
                    trigger: Trigger::Connect,
                    phase: state.phase,
                });
            }
            state.last_error = None;
            state.begin(BusyLabel::InitializingLink);
            Ok(())
        })?;

        let guard = BusyGuard::new(&self.state, Phase::Locked);
        let outcome = self.link_wallet().await;
        guard.disarm();

        match outcome {
            Ok(address) => {
                let shown = redact_address(&address);
                tracing::info!(wallet = %shown, "wallet connected");
                self.state.send_modify(|state| {
                    state.phase = Phase::Connected;
                    state.wallet_address = Some(address);
                    state.display_address = Some(shown);
                    state.settle();
                });
                Ok(())
            }
            Err(code) => {
                tracing::warn!(error = %code, "wallet connection failed");
                self.state.send_modify(|state| {
                    state.last_error = Some(code.clone());
                    state.settle();
                });
                Err(code.into())
            }
        }
    }

    /// Build, sign and confirm the unlock payment.
    #[instrument(skip_all)]
    pub async fn pay(&self) -> Result<(), TriggerError> {
        let address = self.claim(Trigger::Pay, |state| {
            let Some(address) = state.wallet_address.clone() else {
                state.last_error = Some(ErrorCode::NoWallet);
                return Err(TriggerError::Failed(ErrorCode::NoWallet));
            };
            if state.phase != Phase::Connected {
                return Err(TriggerError::InvalidPhase {
                    trigger: Trigger::Pay,
                    phase: state.phase,
                });
            }
            state.phase = Phase::Paying;
            state.last_error = None;
            state.begin(BusyLabel::BuildingTx);
            Ok(address)
        });

        let address = match address {
            Ok(address) => address,
            Err(TriggerError::Failed(code)) => {
                tracing::warn!(error = %code, "pay rejected: no wallet connected");
                return Err(TriggerError::Failed(code));
            }
            Err(e) => return Err(e),
        };

        let guard = BusyGuard::new(&self.state, Phase::Connected);
        let outcome = self.attempt_payment(&address).await;
        guard.disarm();

        match outcome {
            Ok(()) => {
                tracing::info!(wallet = %redact_address(&address), "payment confirmed, unlocked");
                self.state.send_modify(|state| {
                    state.phase = Phase::Unlocked;
                    state.settle();
                });
                Ok(())
            }
            Err(code) => {
                tracing::warn!(error = %code, "payment failed");
                self.state.send_modify(|state| {
                    state.phase = Phase::Connected;
                    state.last_error = Some(code.clone());
                    state.settle();
                });
                Err(code.into())
            }
        }
    }

    /// Return to a fresh Locked session. Rejected only while an operation is
    /// in flight.
    #[instrument(skip_all)]
    pub fn reset(&self) -> Result<(), TriggerError> {
        self.claim(Trigger::Reset, |state| {
            *state = SessionState::new();
            Ok(())
        })?;
        tracing::info!("session reset");
        Ok(())
    }

    /// Apply `f` atomically unless the session is busy. The state is only
    /// published when `f` succeeds or records an error.
    fn claim<T>(
        &self,
        trigger: Trigger,
        f: impl FnOnce(&mut SessionState) -> Result<T, TriggerError>,
    ) -> Result<T, TriggerError> {
        let mut outcome = None;
        self.state.send_if_modified(|state| {
            if state.busy {
                outcome = Some(Err(TriggerError::Busy { trigger }));
                return false;
            }
            let before = state.clone();
            let result = f(state);
            let modified = *state != before;
            outcome = Some(result);
            modified
        });

        let outcome = outcome.unwrap_or(Err(TriggerError::Busy { trigger }));
        if let Err(TriggerError::Busy { .. } | TriggerError::InvalidPhase { .. }) = &outcome {
            tracing::debug!(%trigger, "trigger ignored");
        }
        outcome
    }

    fn set_label(&self, label: BusyLabel) {
        self.state.send_modify(|state| state.busy_label = Some(label));
    }

    async fn link_wallet(&self) -> Result<String, ErrorCode> {
        let present = self.wallet.is_present().await.map_err(|e| {
            tracing::warn!(error = %e, "wallet presence check failed");
            ErrorCode::ConnectionFailed
        })?;
        if !present {
            return Err(ErrorCode::WalletNotFound);
        }

        let address = self.wallet.address().await.map_err(|e| {
            tracing::warn!(error = %e, "wallet address request failed");
            ErrorCode::ConnectionFailed
        })?;

        address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(ErrorCode::AccessDenied)
    }

    async fn attempt_payment(&self, address: &str) -> Result<(), ErrorCode> {
        let signed = self.request_signature(address).await?;

        if self.config.submit {
            self.set_label(BusyLabel::SubmittingTx);
            let resp = self
                .ledger
                .submit_transaction(&signed)
                .await
                .map_err(tx_failed)?;
            if !resp.successful {
                return Err(ErrorCode::TxFailed(TxFailure::Message(format!(
                    "transaction {} rejected by ledger",
                    resp.hash
                ))));
            }
            tracing::info!(hash = %resp.hash, ledger = ?resp.ledger, "transaction submitted");
        }

        self.set_label(BusyLabel::Verifying);
        tokio::time::sleep(self.config.confirmation_delay).await;
        Ok(())
    }

    /// Fresh account and fee, build, encode, sign.
    async fn request_signature(&self, address: &str) -> Result<SignedPayload, ErrorCode> {
        let account = self.ledger.load_account(address).await.map_err(tx_failed)?;
        let fee = self.ledger.fetch_base_fee().await.map_err(tx_failed)?;

        let intent = PaymentIntent::new(&self.config, account, fee).map_err(tx_failed)?;
        let tx = TransactionBuilder::build(&intent, unix_now().map_err(tx_failed)?)
            .map_err(tx_failed)?;
        let encoded = tx.to_xdr_base64().map_err(tx_failed)?;

        tracing::debug!(
            sequence = tx.sequence,
            fee = tx.fee,
            max_time = tx.time_bounds.max_time,
            "payment transaction built"
        );

        self.set_label(BusyLabel::WaitingSignature);
        let request = SignRequest {
            encoded_transaction: encoded,
            network: self.config.network_name.clone(),
            network_passphrase: self.config.network_passphrase.clone(),
        };

        self.wallet
            .sign(&request)
            .await
            .map_err(tx_failed)?
            .ok_or(ErrorCode::TxFailed(TxFailure::UserRejected))
    }
}

/// Settles a transition whose future is dropped mid-flight: the session goes
/// back to `restore` and `busy` is cleared.
struct BusyGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    restore: Phase,
    armed: bool,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a watch::Sender<SessionState>, restore: Phase) -> Self {
        Self {
            state,
            restore,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let restore = self.restore;
        tracing::warn!(phase = %restore, "operation cancelled before settling");
        self.state.send_modify(|state| {
            state.phase = restore;
            state.settle();
        });
    }
}

fn tx_failed(err: X402Error) -> ErrorCode {
    ErrorCode::TxFailed(TxFailure::Message(err.to_string()))
}
