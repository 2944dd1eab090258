//! Vault events
//!
//! Immutable records emitted by ledger operations for external indexers.
//! The ledger never reads them back.

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, AssetId};
use types::numeric::Amount;

/// Assets pulled into custody and credited to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub holder: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
    pub timestamp: i64,
}

/// Assets debited from a holder and pushed out of custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub holder: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
    pub timestamp: i64,
}

/// Gate closed by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paused {
    pub account: AccountId,
    pub timestamp: i64,
}

/// Gate reopened by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unpaused {
    pub account: AccountId,
    pub timestamp: i64,
}

/// Owner proposed a successor; the handoff completes on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferStarted {
    pub previous_owner: AccountId,
    pub new_owner: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous_owner: AccountId,
    pub new_owner: AccountId,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    Deposited(Deposited),
    Withdrawn(Withdrawn),
    Paused(Paused),
    Unpaused(Unpaused),
    OwnershipTransferStarted(OwnershipTransferStarted),
    OwnershipTransferred(OwnershipTransferred),
}

impl LedgerEvent {
    /// Variant name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Deposited(_) => "Deposited",
            LedgerEvent::Withdrawn(_) => "Withdrawn",
            LedgerEvent::Paused(_) => "Paused",
            LedgerEvent::Unpaused(_) => "Unpaused",
            LedgerEvent::OwnershipTransferStarted(_) => "OwnershipTransferStarted",
            LedgerEvent::OwnershipTransferred(_) => "OwnershipTransferred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposited_serialization() {
        let event = Deposited {
            holder: AccountId::new(),
            asset: AssetId::new(),
            amount: Amount::from(100u64),
            timestamp: 1_708_123_456,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: Deposited = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_enum_is_tagged() {
        let event = LedgerEvent::Withdrawn(Withdrawn {
            holder: AccountId::new(),
            asset: AssetId::new(),
            amount: Amount::from(50u64),
            timestamp: 7,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Withdrawn");
        assert_eq!(value["type"], event.name());
        assert_eq!(value["amount"], "50");
    }
}
