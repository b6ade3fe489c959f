//! Access ledger for LastSecret delegated secrets

pub mod clock;
pub mod error;
pub mod ledger;
pub mod verifier;

pub use clock::*;
pub use error::*;
pub use ledger::*;
pub use verifier::*;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
