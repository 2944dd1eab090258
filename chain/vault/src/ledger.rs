//! Ledger — multi-asset custody with deposit, withdraw and a pause gate
//!
//! Every operation runs under one operation lock that spans the external
//! transfer call. Other threads block on the lock; a nested mutating call
//! from the same thread (a transfer callback) gets past the lock but is
//! refused by the reentrancy guard. Admin calls made from a callback are
//! refused the same way, so the gate cannot close under an operation that
//! already passed it.
//!
//! Mutating operations follow the same sequence:
//! 1. Reentrancy guard
//! 2. Pause gate
//! 3. Input validation
//! 4. Bookkeeping (balance entry and asset total together)
//! 5. External transfer; if it fails or unwinds the bookkeeping is reverted
//! 6. Event record

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::ids::{AccountId, AssetId};
use types::numeric::Amount;

use crate::book::{Applied, BalanceBook, Undo};
use crate::config::LedgerConfig;
use crate::errors::{ConfigError, LedgerError};
use crate::events::{
    Deposited, LedgerEvent, OwnershipTransferStarted, OwnershipTransferred, Paused, Unpaused,
    Withdrawn,
};
use crate::ports::{Clock, SystemClock, TransferPort};
use crate::security::{GateState, Ownership, PauseGate, ReentrancyGuard};

/// Kind of balance-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Deposit,
    Withdraw,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
        }
    }
}

/// Outcome of a successful deposit or withdraw, with post-operation values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub operation: Operation,
    pub asset: AssetId,
    pub holder: AccountId,
    pub amount: Amount,
    /// Holder's balance entry after the operation
    pub balance: Amount,
    /// Asset total after the operation
    pub total: Amount,
    pub timestamp: i64,
}

#[derive(Debug)]
struct LedgerState {
    book: BalanceBook,
    gate: PauseGate,
    ownership: Ownership,
    /// Emitted events (append-only, oldest dropped past the configured cap)
    events: VecDeque<LedgerEvent>,
    /// Records dropped from the front of `events` so far
    evicted: u64,
}

impl LedgerState {
    fn record(&mut self, event: LedgerEvent, config: &LedgerConfig) {
        let cap = config.max_event_log;
        if cap > 0 && self.events.len() >= cap {
            if let Some(dropped) = self.events.pop_front() {
                self.evicted += 1;
                warn!(
                    ledger = %config.name,
                    event = dropped.name(),
                    evicted = self.evicted,
                    cap,
                    "event log full, oldest record dropped"
                );
            }
        }
        self.events.push_back(event);
    }
}

/// Everything behind the operation lock. The guard lives outside the
/// `RefCell` so a reentrant call can be refused without touching state.
#[derive(Debug)]
struct LedgerCell {
    guard: ReentrancyGuard,
    state: RefCell<LedgerState>,
}

/// Reverts one applied bookkeeping effect when dropped, unless disarmed.
///
/// Covers both an `Err` from the transfer port and a panic unwinding out of
/// it.
struct Rollback<'a> {
    ledger: &'a str,
    state: &'a RefCell<LedgerState>,
    undo: Option<Undo>,
}

impl Rollback<'_> {
    fn disarm(mut self) {
        self.undo = None;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.book.revert(undo),
            Err(_) => warn!(ledger = %self.ledger, "state busy, bookkeeping not reverted"),
        }
        if std::thread::panicking() {
            warn!(ledger = %self.ledger, "transfer panicked, bookkeeping reverted");
        }
    }
}

/// Custody ledger.
///
/// Balances are keyed by (asset, holder); each asset also carries a running
/// total that always equals the sum of its entries. The ledger is `Sync` and
/// is usually shared behind an `Arc`.
pub struct Ledger {
    config: LedgerConfig,
    cell: ReentrantMutex<LedgerCell>,
    transfers: Arc<dyn TransferPort>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Create a ledger that timestamps events with the wall clock.
    pub fn new(config: LedgerConfig, transfers: Arc<dyn TransferPort>) -> Result<Self, ConfigError> {
        Self::with_clock(config, transfers, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: LedgerConfig,
        transfers: Arc<dyn TransferPort>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            ledger = %config.name,
            owner = %config.owner,
            custodian = %config.custodian,
            "ledger initialized"
        );

        let state = LedgerState {
            book: BalanceBook::new(),
            gate: PauseGate::new(),
            ownership: Ownership::new(config.owner),
            events: VecDeque::new(),
            evicted: 0,
        };

        Ok(Self {
            cell: ReentrantMutex::new(LedgerCell {
                guard: ReentrancyGuard::new(),
                state: RefCell::new(state),
            }),
            config,
            transfers,
            clock,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ───────────────────────── Deposit / Withdraw ─────────────────────────

    /// Credit `holder` with `amount` of `asset`, then pull it into custody.
    ///
    /// If the pull fails the credit is reverted and `TransferFailed` is
    /// returned.
    pub fn deposit(
        &self,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<Receipt, LedgerError> {
        self.execute(Operation::Deposit, asset, holder, amount)
    }

    /// Debit `holder` by `amount` of `asset`, then push it out of custody.
    ///
    /// The debit is recorded before the push, so anything the push does
    /// sees the reduced balance. If the push fails the debit is reverted.
    pub fn withdraw(
        &self,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<Receipt, LedgerError> {
        self.execute(Operation::Withdraw, asset, holder, amount)
    }

    fn execute(
        &self,
        operation: Operation,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<Receipt, LedgerError> {
        let cell = self.cell.lock();
        let _entered = cell.guard.enter().map_err(|err| {
            warn!(
                ledger = %self.config.name,
                op = operation.label(),
                holder = %holder,
                asset = %asset,
                "reentrant call rejected"
            );
            err
        })?;

        let (applied, undo) = {
            let mut state = cell.state.borrow_mut();
            let checked = Self::check_request(&state.gate, &asset, amount).and_then(|()| {
                match operation {
                    Operation::Deposit => state.book.credit(asset, holder, amount),
                    Operation::Withdraw => state.book.debit(asset, holder, amount),
                }
            });
            checked.map_err(|err| {
                debug!(
                    ledger = %self.config.name,
                    op = operation.label(),
                    holder = %holder,
                    asset = %asset,
                    amount = %amount,
                    error = %err,
                    "request rejected"
                );
                err
            })?
        };

        let rollback = Rollback {
            ledger: &self.config.name,
            state: &cell.state,
            undo: Some(undo),
        };

        // No state borrow is held past this point: the port may call back in.
        let transferred = match operation {
            Operation::Deposit => self.transfers.pull(&asset, &holder, amount),
            Operation::Withdraw => self.transfers.push(&asset, &holder, amount),
        };

        if let Err(err) = transferred {
            drop(rollback);
            warn!(
                ledger = %self.config.name,
                op = operation.label(),
                holder = %holder,
                asset = %asset,
                amount = %amount,
                error = %err,
                "transfer failed, bookkeeping reverted"
            );
            return Err(LedgerError::TransferFailed(err));
        }
        rollback.disarm();

        let timestamp = self.clock.now();
        let receipt = Self::receipt(operation, asset, holder, amount, applied, timestamp);
        let event = match operation {
            Operation::Deposit => LedgerEvent::Deposited(Deposited {
                holder,
                asset,
                amount,
                timestamp,
            }),
            Operation::Withdraw => LedgerEvent::Withdrawn(Withdrawn {
                holder,
                asset,
                amount,
                timestamp,
            }),
        };
        cell.state.borrow_mut().record(event, &self.config);

        info!(
            ledger = %self.config.name,
            op = operation.label(),
            holder = %holder,
            asset = %asset,
            amount = %amount,
            balance = %receipt.balance,
            total = %receipt.total,
            "operation settled"
        );
        Ok(receipt)
    }

    fn check_request(gate: &PauseGate, asset: &AssetId, amount: Amount) -> Result<(), LedgerError> {
        gate.ensure_active()?;
        if asset.is_null() {
            return Err(LedgerError::InvalidAsset);
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(())
    }

    fn receipt(
        operation: Operation,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
        applied: Applied,
        timestamp: i64,
    ) -> Receipt {
        Receipt {
            operation,
            asset,
            holder,
            amount,
            balance: applied.balance,
            total: applied.total,
            timestamp,
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Balance entry for (asset, holder). Zero if never seen.
    pub fn get_balance(&self, asset: &AssetId, holder: &AccountId) -> Amount {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.book.balance(asset, holder)
    }

    /// Sum of all holders' entries for `asset`. Zero if never seen.
    pub fn get_total_deposits(&self, asset: &AssetId) -> Amount {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.book.total(asset)
    }

    /// Every entry held by `holder`, ordered by asset.
    pub fn holdings(&self, holder: &AccountId) -> Vec<(AssetId, Amount)> {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.book.holdings(holder)
    }

    /// Every asset ever deposited.
    pub fn assets(&self) -> Vec<AssetId> {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.book.assets()
    }

    // ───────────────────────── Invariant Checks ─────────────────────────

    /// Verify that every asset total equals the sum of its entries.
    pub fn audit(&self) -> Result<(), LedgerError> {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.book.audit()
    }

    /// Compare the recorded total for `asset` with what the transfer port
    /// reports as custodied.
    pub fn verify_custody(&self, asset: &AssetId) -> Result<(), LedgerError> {
        let cell = self.cell.lock();
        let recorded = cell.state.borrow().book.total(asset);
        let custodied = self.transfers.custodied(asset);
        if recorded != custodied {
            warn!(
                ledger = %self.config.name,
                asset = %asset,
                recorded = %recorded,
                custodied = %custodied,
                "custody mismatch"
            );
            return Err(LedgerError::CustodyMismatch {
                asset: *asset,
                recorded,
                custodied,
            });
        }
        Ok(())
    }

    // ───────────────────────── Pause ─────────────────────────

    /// Close the gate. Owner-only.
    pub fn pause(&self, caller: &AccountId) -> Result<(), LedgerError> {
        let timestamp = self.clock.now();
        let cell = self.cell.lock();
        self.ensure_idle(&cell, "pause")?;
        let mut state = cell.state.borrow_mut();
        self.ensure_owner(&state, caller, "pause")?;
        state.gate.pause()?;
        state.record(
            LedgerEvent::Paused(Paused {
                account: *caller,
                timestamp,
            }),
            &self.config,
        );

        info!(ledger = %self.config.name, by = %caller, "ledger paused");
        Ok(())
    }

    /// Reopen the gate. Owner-only.
    pub fn unpause(&self, caller: &AccountId) -> Result<(), LedgerError> {
        let timestamp = self.clock.now();
        let cell = self.cell.lock();
        self.ensure_idle(&cell, "unpause")?;
        let mut state = cell.state.borrow_mut();
        self.ensure_owner(&state, caller, "unpause")?;
        state.gate.unpause()?;
        state.record(
            LedgerEvent::Unpaused(Unpaused {
                account: *caller,
                timestamp,
            }),
            &self.config,
        );

        info!(ledger = %self.config.name, by = %caller, "ledger unpaused");
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.gate_state() == GateState::Paused
    }

    pub fn gate_state(&self) -> GateState {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.gate.state()
    }

    // ───────────────────────── Ownership ─────────────────────────

    pub fn owner(&self) -> AccountId {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.ownership.owner()
    }

    pub fn pending_owner(&self) -> Option<AccountId> {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.ownership.pending_owner()
    }

    /// Propose `new_owner` as successor. Owner-only; takes effect on
    /// `accept_ownership`.
    pub fn transfer_ownership(
        &self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), LedgerError> {
        let cell = self.cell.lock();
        self.ensure_idle(&cell, "transfer_ownership")?;
        let mut state = cell.state.borrow_mut();
        self.ensure_owner(&state, caller, "transfer_ownership")?;
        state.ownership.propose(caller, new_owner)?;
        state.record(
            LedgerEvent::OwnershipTransferStarted(OwnershipTransferStarted {
                previous_owner: *caller,
                new_owner,
            }),
            &self.config,
        );

        info!(ledger = %self.config.name, owner = %caller, pending = %new_owner, "ownership transfer started");
        Ok(())
    }

    /// Complete a pending handoff. Only the proposed owner may call this.
    pub fn accept_ownership(&self, caller: &AccountId) -> Result<(), LedgerError> {
        let cell = self.cell.lock();
        self.ensure_idle(&cell, "accept_ownership")?;
        let mut state = cell.state.borrow_mut();
        let previous_owner = state.ownership.accept(caller).map_err(|err| {
            warn!(ledger = %self.config.name, caller = %caller, "ownership accept refused");
            err
        })?;
        state.record(
            LedgerEvent::OwnershipTransferred(OwnershipTransferred {
                previous_owner,
                new_owner: *caller,
            }),
            &self.config,
        );

        info!(ledger = %self.config.name, previous = %previous_owner, owner = %caller, "ownership transferred");
        Ok(())
    }

    /// Refuse admin calls made from inside an in-flight deposit or withdraw.
    fn ensure_idle(&self, cell: &LedgerCell, action: &'static str) -> Result<(), LedgerError> {
        if cell.guard.is_entered() {
            warn!(ledger = %self.config.name, action, "admin call during transfer rejected");
            return Err(LedgerError::Reentrancy);
        }
        Ok(())
    }

    fn ensure_owner(
        &self,
        state: &LedgerState,
        caller: &AccountId,
        action: &'static str,
    ) -> Result<(), LedgerError> {
        state.ownership.ensure_owner(caller).map_err(|err| {
            warn!(ledger = %self.config.name, caller = %caller, action, "unauthorized admin call");
            err
        })
    }

    // ───────────────────────── Events ─────────────────────────

    /// Snapshot of the retained event log, oldest first.
    pub fn events(&self) -> Vec<LedgerEvent> {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.events.iter().cloned().collect()
    }

    /// Number of records dropped from the log because it hit
    /// `max_event_log`. A consumer that sees this grow has missed events.
    pub fn evicted_events(&self) -> u64 {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        state.evicted
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        let cell = self.cell.lock();
        let mut state = cell.state.borrow_mut();
        state.events.drain(..).collect()
    }
}
