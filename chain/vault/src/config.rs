//! Ledger configuration

use serde::{Deserialize, Serialize};
use types::ids::AccountId;

use crate::errors::ConfigError;

fn default_name() -> String {
    "token-vault".to_string()
}

fn default_max_event_log() -> usize {
    10_000
}

/// Configuration for a ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Initial owner, allowed to pause and unpause.
    pub owner: AccountId,
    /// Account under which the transfer port holds custodied assets.
    pub custodian: AccountId,
    /// Label attached to log lines.
    #[serde(default = "default_name")]
    pub name: String,
    /// Maximum number of retained event records; 0 keeps everything.
    #[serde(default = "default_max_event_log")]
    pub max_event_log: usize,
}

impl LedgerConfig {
    pub fn new(owner: AccountId, custodian: AccountId) -> Self {
        Self {
            owner,
            custodian,
            name: default_name(),
            max_event_log: default_max_event_log(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_nil() {
            return Err(ConfigError::Invalid("owner must not be nil".to_string()));
        }
        if self.custodian.is_nil() {
            return Err(ConfigError::Invalid("custodian must not be nil".to_string()));
        }
        if self.owner == self.custodian {
            return Err(ConfigError::Invalid(
                "owner and custodian must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}
