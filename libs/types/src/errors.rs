//! Error types for the shared vault types

use thiserror::Error;

/// Failure to parse an [`Amount`](crate::numeric::Amount) from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {input}")]
    Invalid { input: String },
}
