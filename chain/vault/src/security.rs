//! Security primitives for the ledger
//!
//! Reentrancy guard, pause gate and owner capability. None of these take a
//! lock themselves; the ledger owns them behind its operation lock.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use types::ids::AccountId;

use crate::errors::LedgerError;

/// Reentrancy guard preventing nested calls into protected operations.
///
/// `enter` hands out a scoped token; the guard is released when the token is
/// dropped, on every exit path.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self {
            entered: Cell::new(false),
        }
    }

    /// Mark an operation as in flight. Fails with `Reentrancy` if one already is.
    pub fn enter(&self) -> Result<Entered<'_>, LedgerError> {
        if self.entered.replace(true) {
            return Err(LedgerError::Reentrancy);
        }
        Ok(Entered { guard: self })
    }

    /// Check if an operation is currently in flight.
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

/// Scoped proof that the guard is held.
#[derive(Debug)]
#[must_use = "the guard is released as soon as this is dropped"]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}

/// State of the pause gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Active,
    Paused,
}

/// Two-state pause gate. Transitions are strict: pausing a paused gate or
/// unpausing an active one is an error.
#[derive(Debug, Clone, Default)]
pub struct PauseGate {
    state: GateState,
}

impl PauseGate {
    /// Create a new active gate.
    pub fn new() -> Self {
        Self {
            state: GateState::Active,
        }
    }

    /// Active → Paused.
    pub fn pause(&mut self) -> Result<(), LedgerError> {
        match self.state {
            GateState::Paused => Err(LedgerError::Paused),
            GateState::Active => {
                self.state = GateState::Paused;
                Ok(())
            }
        }
    }

    /// Paused → Active.
    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        match self.state {
            GateState::Active => Err(LedgerError::NotPaused),
            GateState::Paused => {
                self.state = GateState::Active;
                Ok(())
            }
        }
    }

    /// Fails with `Paused` unless the gate is active.
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_paused() {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.state == GateState::Paused
    }

    pub fn state(&self) -> GateState {
        self.state
    }
}

/// Single-owner capability with a two-step handoff.
///
/// The current owner proposes a successor; ownership moves only when the
/// successor accepts, so a mistyped identity cannot lock administration out.
#[derive(Debug, Clone)]
pub struct Ownership {
    owner: AccountId,
    pending: Option<AccountId>,
}

impl Ownership {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            pending: None,
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn pending_owner(&self) -> Option<AccountId> {
        self.pending
    }

    pub fn is_owner(&self, caller: &AccountId) -> bool {
        self.owner == *caller
    }

    /// Fails with `Unauthorized` unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if !self.is_owner(caller) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Record `new_owner` as the pending successor, replacing any earlier
    /// proposal. Owner-only.
    pub fn propose(&mut self, caller: &AccountId, new_owner: AccountId) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        self.pending = Some(new_owner);
        Ok(())
    }

    /// Complete the handoff. Only the pending owner may accept.
    /// Returns the previous owner.
    pub fn accept(&mut self, caller: &AccountId) -> Result<AccountId, LedgerError> {
        match self.pending {
            Some(pending) if pending == *caller => {
                let previous = self.owner;
                self.owner = pending;
                self.pending = None;
                Ok(previous)
            }
            _ => Err(LedgerError::NoPendingOwner {
                caller: caller.to_string(),
            }),
        }
    }
}
