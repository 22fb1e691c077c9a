use x402::{
    AccountSnapshot, ErrorCode, LedgerGateway, Phase, TriggerError, TxFailure, UnlockConfig,
    UnlockMachine, X402Error, RESOURCE_URL,
};
use x402_wallet::LocalKeyWallet;

const SEED: &str = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";

/// Ledger stub returning a fixed account sequence and base fee.
struct FixedLedger;

impl LedgerGateway for FixedLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot, X402Error> {
        Ok(AccountSnapshot {
            account_id: account_id.to_string(),
            sequence: 7,
        })
    }

    async fn fetch_base_fee(&self) -> Result<u32, X402Error> {
        Ok(100)
    }
}

async fn run(wallet: LocalKeyWallet) -> (Result<String, TriggerError>, Phase, Vec<String>) {
    let machine = UnlockMachine::with_config(wallet, FixedLedger, UnlockConfig::default());
    let view = tokio::spawn(x402_client::follow(machine.subscribe(), Vec::new()));

    let outcome = x402_client::run_unlock(&machine).await;
    let phase = machine.snapshot().phase;
    drop(machine);

    let out = String::from_utf8(view.await.unwrap().unwrap()).unwrap();
    (outcome, phase, out.lines().map(str::to_string).collect())
}

#[tokio::test(start_paused = true)]
async fn test_local_wallet_unlocks() {
    let wallet = LocalKeyWallet::from_secret(SEED).unwrap();
    let (outcome, phase, lines) = run(wallet).await;

    assert_eq!(outcome.unwrap(), RESOURCE_URL);
    assert_eq!(phase, Phase::Unlocked);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("STATUS: UNLOCKED | WALLET: GDVE...ZA57")
    );
    assert!(lines.iter().any(|l| l.ends_with("VERIFYING...")));
}

#[tokio::test(start_paused = true)]
async fn test_declined_prompt_stays_connected() {
    let wallet = LocalKeyWallet::from_secret(SEED)
        .unwrap()
        .with_approval(|_| false);
    let (outcome, phase, lines) = run(wallet).await;

    assert_eq!(
        outcome.unwrap_err(),
        TriggerError::Failed(ErrorCode::TxFailed(TxFailure::UserRejected))
    );
    assert_eq!(phase, Phase::Connected);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("STATUS: CONNECTED | WALLET: GDVE...ZA57 | ERR: TX_FAILED: USER_REJECTED")
    );
}
