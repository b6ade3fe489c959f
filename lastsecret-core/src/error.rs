//! Error types for the LastSecret core

use crate::domain::DomainScheme;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature recovery failed")]
    RecoveryFailed,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Scheme mismatch: domain pins {expected}, grant carries {got}")]
    SchemeMismatch {
        expected: DomainScheme,
        got: DomainScheme,
    },
}
