use std::io::Write;

use tokio::sync::watch;
use x402::SessionState;

/// One status line for a session state.
///
/// `STATUS: CONNECTED | WALLET: GDVE...ZA57 | ERR: TX_FAILED: USER_REJECTED`
pub fn render(state: &SessionState) -> String {
    let mut parts = vec![format!(
        "STATUS: {}",
        state.phase.to_string().to_uppercase()
    )];

    if let Some(addr) = &state.display_address {
        parts.push(format!("WALLET: {addr}"));
    }
    if let Some(label) = state.busy_label.filter(|_| state.busy) {
        parts.push(label.as_str().to_string());
    }
    if let Some(err) = &state.last_error {
        parts.push(err.to_string());
    }

    parts.join(" | ")
}

/// Print a status line for every observed state until the machine is dropped.
///
/// Consecutive identical lines are collapsed. Returns the writer so callers
/// can inspect buffered output.
pub async fn follow<Wr: Write>(
    mut rx: watch::Receiver<SessionState>,
    mut out: Wr,
) -> std::io::Result<Wr> {
    let mut last = String::new();
    loop {
        let line = render(&rx.borrow_and_update());
        if line != last {
            writeln!(out, "{line}")?;
            out.flush()?;
            last = line;
        }
        if rx.changed().await.is_err() {
            return Ok(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402::{BusyLabel, ErrorCode, Phase, TxFailure};

    fn connected() -> SessionState {
        SessionState {
            phase: Phase::Connected,
            wallet_address: Some("GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57".into()),
            display_address: Some("GDVE...ZA57".into()),
            ..SessionState::default()
        }
    }

    #[test]
    fn test_render_locked() {
        assert_eq!(render(&SessionState::new()), "STATUS: LOCKED");
    }

    #[test]
    fn test_render_wallet_not_found() {
        let state = SessionState {
            last_error: Some(ErrorCode::WalletNotFound),
            ..SessionState::default()
        };
        assert_eq!(render(&state), "STATUS: LOCKED | ERR: WALLET_NOT_FOUND");
    }

    #[test]
    fn test_render_busy_label() {
        let state = SessionState {
            phase: Phase::Paying,
            busy: true,
            busy_label: Some(BusyLabel::WaitingSignature),
            ..connected()
        };
        assert_eq!(
            render(&state),
            "STATUS: PAYING | WALLET: GDVE...ZA57 | WAITING_SIGNATURE..."
        );
    }

    #[test]
    fn test_render_never_shows_full_address() {
        let state = SessionState {
            last_error: Some(ErrorCode::TxFailed(TxFailure::UserRejected)),
            ..connected()
        };
        let line = render(&state);
        assert_eq!(
            line,
            "STATUS: CONNECTED | WALLET: GDVE...ZA57 | ERR: TX_FAILED: USER_REJECTED"
        );
        assert!(!line.contains("GDVEU3DD4KOFECV66"));
    }

    #[tokio::test]
    async fn test_follow_collapses_duplicates_and_stops_on_drop() {
        let (tx, rx) = watch::channel(SessionState::new());
        let task = tokio::spawn(follow(rx, Vec::new()));

        tokio::task::yield_now().await;
        tx.send_replace(SessionState::new());
        tokio::task::yield_now().await;
        tx.send_replace(connected());
        drop(tx);

        let out = String::from_utf8(task.await.unwrap().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.first(), Some(&"STATUS: LOCKED"));
        assert_eq!(lines.last(), Some(&"STATUS: CONNECTED | WALLET: GDVE...ZA57"));
        assert_eq!(lines.iter().filter(|l| **l == "STATUS: LOCKED").count(), 1);
    }
}
