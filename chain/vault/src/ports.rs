//! Collaborator ports
//!
//! The ledger moves value only through a `TransferPort` and reads time only
//! through a `Clock`. Both are shared trait objects supplied at construction.

use std::sync::atomic::{AtomicI64, Ordering};
use types::ids::{AccountId, AssetId};
use types::numeric::Amount;

use crate::errors::TransferError;

/// Moves assets between holders and the ledger's custody.
///
/// Implementations are untrusted: any call may fail, and any call may
/// re-enter the ledger that issued it before returning.
pub trait TransferPort: Send + Sync {
    /// Pull `amount` of `asset` from `from` into custody.
    fn pull(&self, asset: &AssetId, from: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Push `amount` of `asset` out of custody to `to`.
    fn push(&self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Quantity of `asset` currently held in custody.
    fn custodied(&self, asset: &AssetId) -> Amount;
}

/// Source of event timestamps, in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock that only moves when told to. Used for deterministic replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
