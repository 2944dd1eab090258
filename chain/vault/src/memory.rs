//! In-memory token registry implementing `TransferPort`
//!
//! Models fungible tokens the way an ERC-20 does: external balances per
//! (asset, account) plus allowances granted to the custodian. `pull`
//! requires both balance and allowance and consumes the allowance; `push`
//! pays out of the custodian's balance.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use types::ids::{AccountId, AssetId};
use types::numeric::Amount;

use crate::errors::TransferError;
use crate::ports::TransferPort;

#[derive(Debug, Default)]
struct Tokens {
    /// (asset, account) -> external balance
    balances: HashMap<(AssetId, AccountId), Amount>,
    /// (asset, owner) -> amount the custodian may pull
    allowances: HashMap<(AssetId, AccountId), Amount>,
}

impl Tokens {
    fn balance(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(&(*asset, *account))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn allowance(&self, asset: &AssetId, owner: &AccountId) -> Amount {
        self.allowances
            .get(&(*asset, *owner))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Move `amount` between accounts, checking funds first.
    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let available = self.balance(asset, from);
        let debited = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientFunds {
                asset: *asset,
                required: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected {
                reason: format!("balance overflow for {}", to),
            })?;

        self.balances.insert((*asset, *from), debited);
        self.balances.insert((*asset, *to), credited);
        Ok(())
    }
}

/// Token registry bound to one custodian account.
#[derive(Debug)]
pub struct InMemoryTokens {
    custodian: AccountId,
    tokens: RwLock<Tokens>,
}

impl InMemoryTokens {
    /// Create an empty registry whose custody account is `custodian`.
    pub fn new(custodian: AccountId) -> Self {
        Self {
            custodian,
            tokens: RwLock::new(Tokens::default()),
        }
    }

    pub fn custodian(&self) -> AccountId {
        self.custodian
    }

    /// Create `amount` of `asset` out of thin air for `to`.
    pub fn mint(&self, asset: AssetId, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut tokens = self.tokens.write();
        let balance = tokens
            .balance(&asset, &to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected {
                reason: format!("mint overflow for {}", to),
            })?;
        tokens.balances.insert((asset, to), balance);
        Ok(())
    }

    /// Let the custodian pull up to `amount` of `asset` from `owner`.
    /// Replaces any earlier allowance.
    pub fn approve(&self, asset: AssetId, owner: AccountId, amount: Amount) {
        self.tokens.write().allowances.insert((asset, owner), amount);
    }

    /// Plain holder-to-holder transfer outside the ledger.
    pub fn transfer(
        &self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.tokens.write().transfer(&asset, &from, &to, amount)
    }

    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.tokens.read().balance(asset, account)
    }

    pub fn allowance(&self, asset: &AssetId, owner: &AccountId) -> Amount {
        self.tokens.read().allowance(asset, owner)
    }
}

impl TransferPort for InMemoryTokens {
    fn pull(&self, asset: &AssetId, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut tokens = self.tokens.write();
        let approved = tokens.allowance(asset, from);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientAllowance {
                asset: *asset,
                required: amount,
                approved,
            })?;

        let custodian = self.custodian;
        tokens.transfer(asset, from, &custodian, amount)?;
        tokens.allowances.insert((*asset, *from), remaining);

        debug!(asset = %asset, from = %from, amount = %amount, "pulled into custody");
        Ok(())
    }

    fn push(&self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let custodian = self.custodian;
        self.tokens.write().transfer(asset, &custodian, to, amount)?;

        debug!(asset = %asset, to = %to, amount = %amount, "pushed out of custody");
        Ok(())
    }

    fn custodied(&self, asset: &AssetId) -> Amount {
        self.balance_of(asset, &self.custodian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(units: u64) -> Amount {
        Amount::from(units)
    }

    fn setup() -> (InMemoryTokens, AssetId, AccountId) {
        let tokens = InMemoryTokens::new(AccountId::new());
        let asset = AssetId::new();
        let user = AccountId::new();
        tokens.mint(asset, user, amt(10_000)).unwrap();
        (tokens, asset, user)
    }

    #[test]
    fn test_pull_requires_allowance() {
        let (tokens, asset, user) = setup();
        let err = tokens.pull(&asset, &user, amt(100)).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientAllowance {
                asset,
                required: amt(100),
                approved: Amount::ZERO,
            }
        );
        assert_eq!(tokens.balance_of(&asset, &user), amt(10_000));
    }

    #[test]
    fn test_pull_consumes_allowance() {
        let (tokens, asset, user) = setup();
        tokens.approve(asset, user, amt(150));
        tokens.pull(&asset, &user, amt(100)).unwrap();

        assert_eq!(tokens.allowance(&asset, &user), amt(50));
        assert_eq!(tokens.balance_of(&asset, &user), amt(9_900));
        assert_eq!(tokens.custodied(&asset), amt(100));
    }

    #[test]
    fn test_pull_insufficient_funds_keeps_allowance() {
        let (tokens, asset, user) = setup();
        tokens.approve(asset, user, amt(1_000_000));
        let err = tokens.pull(&asset, &user, amt(20_000)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds { .. }));
        assert_eq!(tokens.allowance(&asset, &user), amt(1_000_000));
        assert_eq!(tokens.custodied(&asset), Amount::ZERO);
    }

    #[test]
    fn test_push_from_custody() {
        let (tokens, asset, user) = setup();
        tokens.approve(asset, user, amt(500));
        tokens.pull(&asset, &user, amt(500)).unwrap();

        tokens.push(&asset, &user, amt(200)).unwrap();
        assert_eq!(tokens.custodied(&asset), amt(300));
        assert_eq!(tokens.balance_of(&asset, &user), amt(9_700));

        let err = tokens.push(&asset, &user, amt(301)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_holder_transfer() {
        let (tokens, asset, user) = setup();
        let other = AccountId::new();
        tokens.transfer(asset, user, other, amt(1)).unwrap();
        assert_eq!(tokens.balance_of(&asset, &other), amt(1));
    }

    #[test]
    fn test_mint_overflow_rejected() {
        let (tokens, asset, user) = setup();
        let err = tokens.mint(asset, user, Amount::MAX).unwrap_err();
        assert!(matches!(err, TransferError::Rejected { .. }));
    }
}
