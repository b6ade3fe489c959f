//! Core identity, hashing, and grant machinery for LastSecret

pub mod domain;
pub mod error;
pub mod grant;
pub mod keys;
pub mod signature;
pub mod typed;
pub mod types;

pub use domain::*;
pub use error::*;
pub use grant::*;
pub use keys::*;
pub use signature::*;
pub use types::*;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_issue_and_recover() {
        let keys = KeyPair::generate();
        let domain = LedgerDomain::new(
            31337,
            Address::from_bytes([0x42; 20]),
            DomainScheme::SaltedV1,
        );
        let issuer = GrantIssuer::new(keys, domain);
        let delegate = Address::from_bytes([0x07; 20]);

        let grant = issuer.issue(delegate, 2_000_000_000).unwrap();
        assert_eq!(
            grant.recover_signer(delegate, &domain).unwrap(),
            issuer.address()
        );
    }

    #[test]
    fn test_grant_survives_json_interchange() {
        let keys = KeyPair::generate();
        let domain = LedgerDomain::new(
            1,
            Address::from_bytes([0x42; 20]),
            DomainScheme::TaggedV2,
        );
        let issuer = GrantIssuer::new(keys, domain);
        let delegate = Address::from_bytes([0x07; 20]);
        let grant = issuer.issue(delegate, 2_000_000_000).unwrap();

        let json = serde_json::to_string(&grant).unwrap();
        let back: AccessGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.recover_signer(delegate, &domain).unwrap(),
            issuer.address()
        );
    }
}
