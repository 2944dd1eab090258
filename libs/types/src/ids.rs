//! Unique identifier types for vault entities
//!
//! Accounts use UUID v7 for time-sortable ordering. Assets are opaque
//! identifiers; the nil UUID is reserved as the null asset sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a holder, owner or custodian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create a new AccountId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Whether this is the all-zero identity.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a fungible asset.
///
/// `AssetId::NULL` is never a valid asset; the ledger rejects it on every
/// mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// The null sentinel
    pub const NULL: AssetId = AssetId(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_creation() {
        let id1 = AccountId::new();
        let id2 = AccountId::new();
        assert_ne!(id1, id2, "AccountIds should be unique");
        assert!(!id1.is_nil());
    }

    #[test]
    fn test_account_id_serialization() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_account_id_nil() {
        assert!(AccountId::from_uuid(Uuid::nil()).is_nil());
    }

    #[test]
    fn test_asset_id_null_sentinel() {
        assert!(AssetId::NULL.is_null());
        assert!(!AssetId::new().is_null());
        assert_eq!(AssetId::from_uuid(Uuid::nil()), AssetId::NULL);
    }

    #[test]
    fn test_asset_id_serializes_as_plain_uuid() {
        let uuid = Uuid::now_v7();
        let asset = AssetId::from_uuid(uuid);
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
