//! Balance book — per-(asset, holder) entries and per-asset totals
//!
//! Both maps change together or not at all: `credit` and `debit` compute
//! every new value before writing any of them, and return an `Undo` record
//! that restores the exact prior values if the surrounding operation fails.

use std::collections::{BTreeMap, HashMap};
use types::ids::{AccountId, AssetId};
use types::numeric::{Amount, U256};

use crate::errors::LedgerError;

/// Prior values of one applied bookkeeping effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping an Undo makes the effect permanent"]
pub struct Undo {
    asset: AssetId,
    holder: AccountId,
    /// `None` when the entry did not exist before the effect
    balance_before: Option<Amount>,
    total_before: Option<Amount>,
}

/// Post-effect values for one (asset, holder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub balance: Amount,
    pub total: Amount,
}

/// Balance entries and asset totals.
///
/// Entries are created on first credit and persist at zero.
#[derive(Debug, Clone, Default)]
pub struct BalanceBook {
    /// (asset, holder) -> amount
    balances: HashMap<(AssetId, AccountId), Amount>,
    /// asset -> sum of all holders' entries
    totals: HashMap<AssetId, Amount>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get balance for a specific asset and holder. Zero if never seen.
    pub fn balance(&self, asset: &AssetId, holder: &AccountId) -> Amount {
        self.balances
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Get the total deposited for an asset. Zero if never seen.
    pub fn total(&self, asset: &AssetId) -> Amount {
        self.totals.get(asset).copied().unwrap_or(Amount::ZERO)
    }

    /// All entries held by `holder`, ordered by asset.
    pub fn holdings(&self, holder: &AccountId) -> Vec<(AssetId, Amount)> {
        let mut entries: Vec<(AssetId, Amount)> = self
            .balances
            .iter()
            .filter(|((_, h), _)| h == holder)
            .map(|((asset, _), amount)| (*asset, *amount))
            .collect();
        entries.sort_by_key(|(asset, _)| *asset);
        entries
    }

    /// Every asset that has ever been credited.
    pub fn assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self.totals.keys().copied().collect();
        assets.sort();
        assets
    }

    /// Increase the holder's entry and the asset total by `amount`.
    ///
    /// Fails with `Overflow` (and writes nothing) if either would exceed
    /// `Amount::MAX`.
    pub fn credit(
        &mut self,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<(Applied, Undo), LedgerError> {
        let undo = self.snapshot(asset, holder);
        let balance_before = self.balance(&asset, &holder);
        let total_before = self.total(&asset);

        let balance = balance_before
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total = total_before
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.write(asset, holder, balance, total);
        Ok((Applied { balance, total }, undo))
    }

    /// Decrease the holder's entry and the asset total by `amount`.
    ///
    /// Fails with `InsufficientBalance` (and writes nothing) if the entry is
    /// smaller than `amount`.
    pub fn debit(
        &mut self,
        asset: AssetId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<(Applied, Undo), LedgerError> {
        let undo = self.snapshot(asset, holder);
        let balance_before = self.balance(&asset, &holder);
        let total_before = self.total(&asset);

        let balance =
            balance_before
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    asset,
                    required: amount,
                    available: balance_before,
                })?;
        // total >= balance by conservation, so this only fails on a corrupted book
        let total = total_before
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::ConservationViolated {
                asset,
                total: total_before,
                sum: self.sum_of_balances(&asset),
            })?;

        self.write(asset, holder, balance, total);
        Ok((Applied { balance, total }, undo))
    }

    /// Restore the values captured by `undo`, removing entries the effect
    /// created.
    pub fn revert(&mut self, undo: Undo) {
        let key = (undo.asset, undo.holder);
        match undo.balance_before {
            Some(balance) => self.balances.insert(key, balance),
            None => self.balances.remove(&key),
        };
        match undo.total_before {
            Some(total) => self.totals.insert(undo.asset, total),
            None => self.totals.remove(&undo.asset),
        };
    }

    fn snapshot(&self, asset: AssetId, holder: AccountId) -> Undo {
        Undo {
            asset,
            holder,
            balance_before: self.balances.get(&(asset, holder)).copied(),
            total_before: self.totals.get(&asset).copied(),
        }
    }

    /// Verify that every asset total equals the sum of its entries.
    pub fn audit(&self) -> Result<(), LedgerError> {
        let mut sums: BTreeMap<AssetId, Amount> = BTreeMap::new();
        let mut overflowed: Option<AssetId> = None;

        for ((asset, _), amount) in &self.balances {
            let sum = sums.entry(*asset).or_insert(Amount::ZERO);
            match sum.checked_add(*amount) {
                Some(next) => *sum = next,
                None => overflowed = Some(*asset),
            }
        }

        if let Some(asset) = overflowed {
            return Err(LedgerError::ConservationViolated {
                asset,
                total: self.total(&asset),
                sum: self.sum_of_balances(&asset),
            });
        }

        for asset in self.assets().into_iter().chain(sums.keys().copied()) {
            let sum = sums.get(&asset).copied().unwrap_or(Amount::ZERO);
            let total = self.total(&asset);
            if total != sum {
                return Err(LedgerError::ConservationViolated {
                    asset,
                    total,
                    sum: sum.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Exact sum of entries for `asset`, rendered as text so it cannot overflow.
    fn sum_of_balances(&self, asset: &AssetId) -> String {
        let (mut low, mut carries) = (U256::zero(), 0u64);
        for ((a, _), amount) in &self.balances {
            if a != asset {
                continue;
            }
            let (next, wrapped) = low.overflowing_add(amount.units());
            low = next;
            if wrapped {
                carries += 1;
            }
        }
        if carries == 0 {
            low.to_string()
        } else {
            format!("{} + {} * 2^256", low, carries)
        }
    }

    fn write(&mut self, asset: AssetId, holder: AccountId, balance: Amount, total: Amount) {
        self.balances.insert((asset, holder), balance);
        self.totals.insert(asset, total);
    }
}
