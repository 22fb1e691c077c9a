use serde::{Deserialize, Serialize};

/// Discrete phase of the unlock protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Locked,
    Connected,
    /// Transient: a `pay` attempt is in flight.
    Paying,
    Unlocked,
}

impl Phase {
    /// Phases in which a wallet address must be stored.
    pub fn holds_wallet(self) -> bool {
        matches!(self, Phase::Connected | Phase::Paying | Phase::Unlocked)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Locked => "locked",
            Phase::Connected => "connected",
            Phase::Paying => "paying",
            Phase::Unlocked => "unlocked",
        };
        f.write_str(s)
    }
}

/// Why a payment attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxFailure {
    /// The wallet declined or returned nothing.
    UserRejected,
    /// Underlying gateway or builder message.
    Message(String),
}

impl std::fmt::Display for TxFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxFailure::UserRejected => f.write_str("USER_REJECTED"),
            TxFailure::Message(msg) => f.write_str(msg),
        }
    }
}

/// User-facing error taxonomy. The only failure shape the presentation
/// layer ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[error("ERR: WALLET_NOT_FOUND")]
    WalletNotFound,
    #[error("ERR: ACCESS_DENIED")]
    AccessDenied,
    #[error("ERR: CONNECTION_FAILED")]
    ConnectionFailed,
    #[error("ERR: NO_WALLET")]
    NoWallet,
    #[error("ERR: TX_FAILED: {0}")]
    TxFailed(TxFailure),
}

/// Progress label shown while `busy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusyLabel {
    InitializingLink,
    BuildingTx,
    WaitingSignature,
    SubmittingTx,
    Verifying,
}

impl BusyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BusyLabel::InitializingLink => "INITIALIZING_LINK...",
            BusyLabel::BuildingTx => "BUILDING_TX...",
            BusyLabel::WaitingSignature => "WAITING_SIGNATURE...",
            BusyLabel::SubmittingTx => "SUBMITTING_TX...",
            BusyLabel::Verifying => "VERIFYING...",
        }
    }
}

impl std::fmt::Display for BusyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single per-session state record.
///
/// Owned and mutated by [`UnlockMachine`](crate::unlock::UnlockMachine);
/// read-only to everyone else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: Phase,
    pub wallet_address: Option<String>,
    pub display_address: Option<String>,
    pub last_error: Option<ErrorCode>,
    pub busy: bool,
    pub busy_label: Option<BusyLabel>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self) -> bool {
        self.phase == Phase::Unlocked
    }

    pub(crate) fn begin(&mut self, label: BusyLabel) {
        self.busy = true;
        self.busy_label = Some(label);
    }

    pub(crate) fn settle(&mut self) {
        self.busy = false;
        self.busy_label = None;
    }
}

/// Shorten an account id for display: first 4 + `...` + last 4 characters.
///
/// Ids of 8 characters or fewer are returned unchanged.
pub fn redact_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_address() {
        assert_eq!(
            redact_address("GC63PSERYMUUUJKYSSFQ7FKRAU5UPIP3XUC6X7DLMZUB7SSCPW5BSIRT"),
            "GC63...SIRT"
        );
        assert_eq!(redact_address("GABC1234WXYZ"), "GABC...WXYZ");
        assert_eq!(redact_address("GABCWXYZ"), "GABCWXYZ");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::WalletNotFound.to_string(), "ERR: WALLET_NOT_FOUND");
        assert_eq!(
            ErrorCode::TxFailed(TxFailure::UserRejected).to_string(),
            "ERR: TX_FAILED: USER_REJECTED"
        );
        assert_eq!(
            ErrorCode::TxFailed(TxFailure::Message("account not found".into())).to_string(),
            "ERR: TX_FAILED: account not found"
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_value(ErrorCode::TxFailed(TxFailure::UserRejected)).unwrap();
        assert_eq!(json["code"], "TX_FAILED");
        assert_eq!(json["reason"], "USER_REJECTED");

        let json = serde_json::to_value(ErrorCode::NoWallet).unwrap();
        assert_eq!(json["code"], "NO_WALLET");
    }

    #[test]
    fn test_session_state_wire_shape() {
        let mut state = SessionState::new();
        state.begin(BusyLabel::BuildingTx);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "locked");
        assert_eq!(json["busy"], true);
        assert_eq!(json["busyLabel"], "BUILDING_TX");
        assert!(json["walletAddress"].is_null());
    }

    #[test]
    fn test_holds_wallet() {
        assert!(!Phase::Locked.holds_wallet());
        assert!(Phase::Connected.holds_wallet());
        assert!(Phase::Paying.holds_wallet());
        assert!(Phase::Unlocked.holds_wallet());
    }
}
