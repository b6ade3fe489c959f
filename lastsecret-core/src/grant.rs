//! Grant issuance and verification primitives
//!
//! An access grant is the owner's signature over (delegate, expiry) under
//! one ledger's domain. The delegate never travels with the grant: the
//! verifying side reconstructs the signed digest with the *calling*
//! identity in the delegate slot, so a grant presented by anyone else
//! recovers an address that is not the owner and dies as an invalid
//! signature. Grants are bearer tokens within that constraint; nothing
//! here stores or revokes them, expiry is the only termination.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainScheme, LedgerDomain};
use crate::keys::KeyPair;
use crate::signature::RecoverableSignature;
use crate::typed;
use crate::types::{Address, Salt};
use crate::{CoreError, Result};

/// Message type declaration naming the delegate and expiry. Field order
/// is wire contract.
const USER_TYPE: &str = "User(address user,uint256 expiresAt)";

/// Claim fields of a grant, tagged by protocol scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum GrantClaim {
    /// Salted-v1 claim: expiry plus the salt its domain separator binds
    #[serde(rename = "salted-v1")]
    Salted { expires_at: u64, salt: Salt },
    /// Tagged-v2 claim: expiry only
    #[serde(rename = "tagged-v2")]
    Tagged { expires_at: u64 },
}

impl GrantClaim {
    /// The scheme this claim was issued under
    pub fn scheme(&self) -> DomainScheme {
        match self {
            GrantClaim::Salted { .. } => DomainScheme::SaltedV1,
            GrantClaim::Tagged { .. } => DomainScheme::TaggedV2,
        }
    }

    /// Last second (unix time, inclusive) at which the grant is valid
    pub fn expires_at(&self) -> u64 {
        match self {
            GrantClaim::Salted { expires_at, .. } => *expires_at,
            GrantClaim::Tagged { expires_at } => *expires_at,
        }
    }
}

/// Digest the owner must have signed for `delegate` under `domain`.
///
/// Fails with a scheme mismatch before any hashing when the claim was
/// issued under a different scheme than the domain pins.
pub fn signing_digest(
    domain: &LedgerDomain,
    delegate: Address,
    claim: &GrantClaim,
) -> Result<[u8; 32]> {
    if claim.scheme() != domain.scheme {
        return Err(CoreError::SchemeMismatch {
            expected: domain.scheme,
            got: claim.scheme(),
        });
    }

    let separator = match claim {
        GrantClaim::Salted { salt, .. } => domain.salted_separator(salt),
        GrantClaim::Tagged { .. } => domain.tagged_separator(),
    };
    let message = typed::hash_struct(
        typed::type_hash(USER_TYPE),
        &[
            typed::address_word(&delegate),
            typed::uint_word(claim.expires_at()),
        ],
    );

    Ok(typed::digest(separator, message))
}

/// A signed authorization token as presented to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    #[serde(flatten)]
    pub claim: GrantClaim,
    pub signature: RecoverableSignature,
}

impl AccessGrant {
    /// The scheme this grant was issued under
    pub fn scheme(&self) -> DomainScheme {
        self.claim.scheme()
    }

    /// Last second (unix time, inclusive) at which the grant is valid
    pub fn expires_at(&self) -> u64 {
        self.claim.expires_at()
    }

    /// Recover the identity that signed this grant for `caller` under
    /// `domain`. Whether that identity is actually the owner is the
    /// verifier's decision, not this function's.
    pub fn recover_signer(&self, caller: Address, domain: &LedgerDomain) -> Result<Address> {
        let digest = signing_digest(domain, caller, &self.claim)?;
        self.signature.recover(&digest)
    }
}

/// Owner-side grant issuer bound to one ledger domain
#[derive(Debug)]
pub struct GrantIssuer {
    keys: KeyPair,
    domain: LedgerDomain,
}

impl GrantIssuer {
    pub fn new(keys: KeyPair, domain: LedgerDomain) -> Self {
        GrantIssuer { keys, domain }
    }

    /// The address grants from this issuer recover to
    pub fn address(&self) -> Address {
        self.keys.address()
    }

    pub fn domain(&self) -> &LedgerDomain {
        &self.domain
    }

    /// Issue a grant for `delegate` expiring at `expires_at`, drawing a
    /// fresh random salt when the domain's scheme calls for one
    pub fn issue(&self, delegate: Address, expires_at: u64) -> Result<AccessGrant> {
        let claim = match self.domain.scheme {
            DomainScheme::SaltedV1 => GrantClaim::Salted {
                expires_at,
                salt: Salt::random(),
            },
            DomainScheme::TaggedV2 => GrantClaim::Tagged { expires_at },
        };
        self.issue_claim(delegate, claim)
    }

    /// Issue against an explicit claim, for callers that pick their own
    /// salt
    pub fn issue_claim(&self, delegate: Address, claim: GrantClaim) -> Result<AccessGrant> {
        let digest = signing_digest(&self.domain, delegate, &claim)?;
        let signature = self.keys.sign_digest(&digest)?;

        Ok(AccessGrant { claim, signature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salted_domain() -> LedgerDomain {
        LedgerDomain::new(31337, Address::from_bytes([0x10; 20]), DomainScheme::SaltedV1)
    }

    fn tagged_domain() -> LedgerDomain {
        LedgerDomain::new(31337, Address::from_bytes([0x10; 20]), DomainScheme::TaggedV2)
    }

    #[test]
    fn test_issued_grant_recovers_owner_for_delegate() {
        for domain in [salted_domain(), tagged_domain()] {
            let issuer = GrantIssuer::new(KeyPair::generate(), domain);
            let delegate = Address::from_bytes([0x22; 20]);
            let grant = issuer.issue(delegate, 2_000_000_000).unwrap();

            let recovered = grant.recover_signer(delegate, &domain).unwrap();
            assert_eq!(recovered, issuer.address());
        }
    }

    #[test]
    fn test_wrong_presenter_recovers_someone_else() {
        let domain = salted_domain();
        let issuer = GrantIssuer::new(KeyPair::generate(), domain);
        let delegate = Address::from_bytes([0x22; 20]);
        let intruder = Address::from_bytes([0x33; 20]);
        let grant = issuer.issue(delegate, 2_000_000_000).unwrap();

        match grant.recover_signer(intruder, &domain) {
            Ok(address) => assert_ne!(address, issuer.address()),
            Err(CoreError::RecoveryFailed) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_digest_changes_with_every_claim_field() {
        let domain = salted_domain();
        let delegate = Address::from_bytes([0x22; 20]);
        let salt = Salt::from_bytes([5; 32]);
        let base = signing_digest(
            &domain,
            delegate,
            &GrantClaim::Salted { expires_at: 100, salt },
        )
        .unwrap();

        let later = signing_digest(
            &domain,
            delegate,
            &GrantClaim::Salted { expires_at: 101, salt },
        )
        .unwrap();
        assert_ne!(base, later);

        let resalted = signing_digest(
            &domain,
            delegate,
            &GrantClaim::Salted {
                expires_at: 100,
                salt: Salt::from_bytes([6; 32]),
            },
        )
        .unwrap();
        assert_ne!(base, resalted);

        let other_delegate = signing_digest(
            &domain,
            Address::from_bytes([0x23; 20]),
            &GrantClaim::Salted { expires_at: 100, salt },
        )
        .unwrap();
        assert_ne!(base, other_delegate);
    }

    #[test]
    fn test_scheme_mismatch_is_typed() {
        let claim = GrantClaim::Tagged { expires_at: 100 };
        let err = signing_digest(&salted_domain(), Address::from_bytes([1; 20]), &claim)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::SchemeMismatch {
                expected: DomainScheme::SaltedV1,
                got: DomainScheme::TaggedV2,
            }
        );
    }

    #[test]
    fn test_issuer_refuses_mismatched_claim() {
        let issuer = GrantIssuer::new(KeyPair::generate(), tagged_domain());
        let claim = GrantClaim::Salted {
            expires_at: 100,
            salt: Salt::from_bytes([1; 32]),
        };
        assert!(issuer
            .issue_claim(Address::from_bytes([1; 20]), claim)
            .is_err());
    }

    #[test]
    fn test_grant_json_shape() {
        let domain = salted_domain();
        let issuer = GrantIssuer::new(KeyPair::generate(), domain);
        let grant = issuer
            .issue(Address::from_bytes([0x22; 20]), 1_700_000_000)
            .unwrap();

        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["scheme"], "salted-v1");
        assert_eq!(json["expires_at"], 1_700_000_000u64);
        assert!(json["salt"].as_str().unwrap().starts_with("0x"));
        assert!(json["signature"].as_str().unwrap().starts_with("0x"));

        let back: AccessGrant = serde_json::from_value(json).unwrap();
        assert_eq!(back, grant);
    }

    #[test]
    fn test_tagged_grant_json_has_no_salt() {
        let issuer = GrantIssuer::new(KeyPair::generate(), tagged_domain());
        let grant = issuer
            .issue(Address::from_bytes([0x22; 20]), 1_700_000_000)
            .unwrap();

        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["scheme"], "tagged-v2");
        assert!(json.get("salt").is_none());
    }
}
