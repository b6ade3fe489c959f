//! Error types for the access ledger

use lastsecret_core::DomainScheme;
use thiserror::Error;

/// Caller-visible rejection kinds. Every variant is terminal for the
/// operation that produced it; callers branch on the kind, so which
/// check fires first is part of the contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized caller")]
    Unauthorized,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Expired grant")]
    Expired,

    #[error("Ledger already initialized")]
    AlreadyInitialized,

    #[error("Scheme mismatch: ledger pins {expected}, grant carries {got}")]
    SchemeMismatch {
        expected: DomainScheme,
        got: DomainScheme,
    },
}
