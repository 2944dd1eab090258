//! Types library for the token vault
//!
//! Identifier and amount types shared by the ledger core and the
//! collaborators that drive it (transfer ports, gateways, indexers).
//!
//! # Modules
//! - `ids`: Unique identifiers (AccountId, AssetId)
//! - `numeric`: Checked integer amounts (Amount)
//! - `errors`: Parse errors

pub mod errors;
pub mod ids;
pub mod numeric;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
