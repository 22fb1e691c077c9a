use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use x402::{HorizonClient, UnlockConfig, UnlockMachine};
use x402_wallet::LocalKeyWallet;

fn load_wallet(config: &UnlockConfig) -> Result<LocalKeyWallet, x402::X402Error> {
    let wallet = match std::env::var("STELLAR_SECRET_KEY")
        .ok()
        .filter(|s| !s.is_empty())
    {
        Some(secret) => LocalKeyWallet::from_secret(&secret)?,
        None => {
            let wallet = LocalKeyWallet::random()?;
            tracing::warn!("STELLAR_SECRET_KEY not set, using an ephemeral key");
            println!("Ephemeral account: {}", wallet.account_id());
            println!("Fund it from the testnet friendbot before paying.");
            wallet
        }
    };

    if std::env::var("X402_AUTO_APPROVE").is_ok() {
        return Ok(wallet);
    }

    let question = x402_client::payment_summary(config);
    Ok(wallet.with_approval(move |_| {
        x402_client::confirm(std::io::stdin().lock(), std::io::stdout(), &question)
    }))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match UnlockConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let wallet = match load_wallet(&config) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        horizon = %config.horizon_url,
        network = %config.network_name,
        submit = config.submit,
        "x402 unlock client"
    );

    let ledger = HorizonClient::new(&config.horizon_url);
    let machine = UnlockMachine::with_config(wallet, ledger, config);

    let view = tokio::spawn(x402_client::follow(machine.subscribe(), std::io::stdout()));
    let outcome = x402_client::run_unlock(&machine).await;
    drop(machine);
    let _ = view.await;

    match outcome {
        Ok(url) => {
            println!("Unlocked: {url}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::warn!("session did not unlock: {e}");
            ExitCode::FAILURE
        }
    }
}
