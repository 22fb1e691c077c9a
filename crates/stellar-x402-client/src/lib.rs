//! Terminal client for x402 pay-to-unlock.
//!
//! A presentation adapter for [`UnlockMachine`](x402::UnlockMachine): it
//! follows the session's watch channel and prints one status line per change,
//! asks for signature approval on a terminal, and drives the
//! connect -> pay sequence.
//!
//! # Quick Example
//!
//! ```no_run
//! use x402::{HorizonClient, UnlockConfig, UnlockMachine};
//! use x402_wallet::LocalKeyWallet;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = UnlockConfig::from_env().unwrap();
//! let wallet = LocalKeyWallet::from_secret("SYOUR_SECRET").unwrap();
//! let machine = UnlockMachine::with_config(
//!     wallet,
//!     HorizonClient::new(&config.horizon_url),
//!     config,
//! );
//!
//! let view = tokio::spawn(x402_client::follow(machine.subscribe(), std::io::stdout()));
//! let unlocked = x402_client::run_unlock(&machine).await;
//! drop(machine);
//! view.await.ok();
//!
//! if let Ok(url) = unlocked {
//!     println!("{url}");
//! }
//! # }
//! ```

mod approval;
mod terminal;

pub use approval::{confirm, payment_summary};
pub use terminal::{follow, render};

use x402::{LedgerGateway, TriggerError, UnlockMachine, WalletGateway};

/// Run connect then pay. Returns the protected resource URL once unlocked.
pub async fn run_unlock<W: WalletGateway, L: LedgerGateway>(
    machine: &UnlockMachine<W, L>,
) -> Result<String, TriggerError> {
    machine.connect().await?;
    machine.pay().await?;

    // pay only returns Ok after the Unlocked transition
    Ok(machine
        .resource_url()
        .unwrap_or(machine.config().resource_url.as_str())
        .to_string())
}
