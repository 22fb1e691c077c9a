//! x402 pay-to-unlock for the Stellar network.
//!
//! Gates a protected resource behind a single native payment: connect a
//! wallet, build and sign a payment transaction, and unlock once the wallet
//! returns a signature.
//!
//! # Components
//!
//! - **Gateways** ([`WalletGateway`], [`LedgerGateway`]): the external wallet
//!   and ledger capabilities, normalized at the boundary
//! - **Builder** ([`TransactionBuilder`]): assembles a sequenced, time-bounded
//!   payment and encodes it as canonical XDR
//! - **State machine** ([`UnlockMachine`]): owns the [`SessionState`] and
//!   drives the gateways through `connect` / `pay` / `reset`
//!
//! # Quick example
//!
//! ```no_run
//! # async fn run<W: x402::WalletGateway>(wallet: W) {
//! use x402::{HorizonClient, UnlockMachine, HORIZON_URL};
//!
//! let machine = UnlockMachine::new(wallet, HorizonClient::new(HORIZON_URL));
//! machine.connect().await.ok();
//! machine.pay().await.ok();
//!
//! if let Some(url) = machine.resource_url() {
//!     println!("unlocked: {url}");
//! }
//! # }
//! ```

// Core types and contracts
pub mod amount;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod session;

// Stellar encoding and construction
pub mod strkey;
pub mod transaction;
pub mod xdr;

// Protocol
pub mod unlock;

// Horizon ledger client
#[cfg(feature = "full")]
pub mod horizon;

// Re-exports
pub use constants::*;
pub use error::X402Error;
pub use gateway::*;
pub use session::*;
pub use transaction::*;
pub use unlock::{Trigger, TriggerError, UnlockMachine};

#[cfg(feature = "full")]
pub use horizon::HorizonClient;
