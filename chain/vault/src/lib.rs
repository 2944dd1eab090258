//! Token Vault — multi-asset custody ledger
//!
//! Tracks what each holder may withdraw of each asset, moves value through
//! an untrusted transfer port, and keeps the per-asset total equal to the
//! sum of balances under concurrent and reentrant callers.
//!
//! # Modules
//! - `errors`: Ledger, transfer and config error types
//! - `events`: Records emitted for external indexers
//! - `security`: Reentrancy guard, pause gate, two-step ownership
//! - `book`: Balance entries and asset totals
//! - `ports`: Transfer port and clock abstractions
//! - `memory`: In-memory token registry implementing the transfer port
//! - `config`: Ledger configuration
//! - `ledger`: The ledger itself

pub mod book;
pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod ports;
pub mod security;

pub use config::LedgerConfig;
pub use errors::{ConfigError, ErrorKind, LedgerError, TransferError};
pub use events::LedgerEvent;
pub use ledger::{Ledger, Operation, Receipt};
pub use memory::InMemoryTokens;
pub use ports::{Clock, ManualClock, SystemClock, TransferPort};
