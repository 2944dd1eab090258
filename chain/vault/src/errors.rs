//! Vault error types
//!
//! Every failure surfaces directly to the caller; nothing is retried inside
//! the ledger. `ErrorKind` groups the variants the way clients act on them.

use thiserror::Error;
use types::ids::AssetId;
use types::numeric::Amount;

/// How a caller should react to a failed ledger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Try again later (gate closed, operation in flight)
    Retryable,
    /// Fix the request
    InvalidInput,
    /// Caller lacks the required capability
    Forbidden,
    /// The external asset moved (or refused to move) value
    External,
    /// Internal bookkeeping disagrees with itself or with custody
    Integrity,
}

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid asset: null asset identifier")]
    InvalidAsset,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Vault is paused")]
    Paused,

    #[error("Vault is not paused")]
    NotPaused,

    #[error("Unauthorized: caller {caller} is not the owner")]
    Unauthorized { caller: String },

    #[error("Insufficient balance for {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: AssetId,
        required: Amount,
        available: Amount,
    },

    #[error("Transfer failed: {0}")]
    TransferFailed(#[source] TransferError),

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("No pending ownership transfer for {caller}")]
    NoPendingOwner { caller: String },

    #[error("Custody mismatch for {asset}: recorded {recorded}, custodied {custodied}")]
    CustodyMismatch {
        asset: AssetId,
        recorded: Amount,
        custodied: Amount,
    },

    #[error("Conservation violated for {asset}: total {total}, sum of balances {sum}")]
    ConservationViolated {
        asset: AssetId,
        total: Amount,
        sum: String,
    },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Paused | LedgerError::Reentrancy => ErrorKind::Retryable,
            LedgerError::InvalidAsset
            | LedgerError::InvalidAmount
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::Overflow => ErrorKind::InvalidInput,
            LedgerError::Unauthorized { .. }
            | LedgerError::NoPendingOwner { .. }
            | LedgerError::NotPaused => ErrorKind::Forbidden,
            LedgerError::TransferFailed(_) => ErrorKind::External,
            LedgerError::CustodyMismatch { .. } | LedgerError::ConservationViolated { .. } => {
                ErrorKind::Integrity
            }
        }
    }
}

/// Failures reported by a transfer port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient funds for {asset}: required {required}, available {available}")]
    InsufficientFunds {
        asset: AssetId,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance for {asset}: required {required}, approved {approved}")]
    InsufficientAllowance {
        asset: AssetId,
        required: Amount,
        approved: Amount,
    },

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
