//! Delegated-access verification
//!
//! The verifier owns the decision of whether a presented grant authorizes
//! a caller. Checks run in a fixed order: enablement, then signature,
//! then expiry. The first failure wins and its kind is visible to the
//! caller, so a disabled identity presenting a malformed grant is told
//! about its enablement, not about the grant. All inputs are captured up
//! front; verification itself touches no ledger state and has no side
//! effects.

use std::collections::HashMap;

use lastsecret_core::{AccessGrant, Address, CoreError, LedgerDomain};

use crate::error::LedgerError;
use crate::Result;

/// One verification pass over a presented grant
pub struct DelegationVerifier<'a> {
    owner: Address,
    domain: &'a LedgerDomain,
    enabled: &'a HashMap<Address, bool>,
    now: u64,
}

impl<'a> DelegationVerifier<'a> {
    pub fn new(
        owner: Address,
        domain: &'a LedgerDomain,
        enabled: &'a HashMap<Address, bool>,
        now: u64,
    ) -> Self {
        DelegationVerifier {
            owner,
            domain,
            enabled,
            now,
        }
    }

    /// Validate `grant` as presented by `caller`
    pub fn verify(&self, caller: Address, grant: &AccessGrant) -> Result<()> {
        self.check_enabled(caller)?;
        self.check_signature(caller, grant)?;
        self.check_expiry(grant.expires_at())?;
        Ok(())
    }

    /// Enablement gate. Identities with no table entry are disabled.
    fn check_enabled(&self, caller: Address) -> Result<()> {
        if self.enabled.get(&caller).copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }

    /// Reconstruct the digest the owner would have signed for `caller`
    /// and require the recovered signer to be the owner
    fn check_signature(&self, caller: Address, grant: &AccessGrant) -> Result<()> {
        let recovered = grant
            .recover_signer(caller, self.domain)
            .map_err(map_core)?;

        if recovered.constant_time_eq(&self.owner) {
            Ok(())
        } else {
            Err(LedgerError::InvalidSignature)
        }
    }

    /// The boundary second is still valid; only `now` strictly past the
    /// expiry rejects
    fn check_expiry(&self, expires_at: u64) -> Result<()> {
        if self.now > expires_at {
            Err(LedgerError::Expired)
        } else {
            Ok(())
        }
    }
}

fn map_core(err: CoreError) -> LedgerError {
    match err {
        CoreError::SchemeMismatch { expected, got } => {
            LedgerError::SchemeMismatch { expected, got }
        }
        _ => LedgerError::InvalidSignature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lastsecret_core::{DomainScheme, GrantIssuer, KeyPair};

    struct Fixture {
        owner: KeyPair,
        domain: LedgerDomain,
        enabled: HashMap<Address, bool>,
        delegate: Address,
    }

    fn fixture(scheme: DomainScheme) -> Fixture {
        let owner = KeyPair::generate();
        let domain = LedgerDomain::new(31337, Address::from_bytes([0x10; 20]), scheme);
        let delegate = Address::from_bytes([0x22; 20]);
        let mut enabled = HashMap::new();
        enabled.insert(delegate, true);

        Fixture {
            owner,
            domain,
            enabled,
            delegate,
        }
    }

    impl Fixture {
        fn issuer(&self) -> GrantIssuer {
            GrantIssuer::new(self.owner.clone(), self.domain)
        }

        fn verifier_at(&self, now: u64) -> DelegationVerifier<'_> {
            DelegationVerifier::new(self.owner.address(), &self.domain, &self.enabled, now)
        }
    }

    #[test]
    fn authz_valid_grant_passes() {
        for scheme in [DomainScheme::SaltedV1, DomainScheme::TaggedV2] {
            let fx = fixture(scheme);
            let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();
            assert!(fx.verifier_at(500).verify(fx.delegate, &grant).is_ok());
        }
    }

    #[test]
    fn authz_boundary_second_is_valid() {
        let fx = fixture(DomainScheme::SaltedV1);
        let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();
        assert!(fx.verifier_at(1_000).verify(fx.delegate, &grant).is_ok());
    }

    #[test]
    fn authz_expired_grant_rejected() {
        let fx = fixture(DomainScheme::SaltedV1);
        let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();
        assert_eq!(
            fx.verifier_at(1_001).verify(fx.delegate, &grant),
            Err(LedgerError::Expired)
        );
    }

    #[test]
    fn authz_disabled_caller_beats_bad_grant() {
        // An unenabled caller is reported as unauthorized even when the
        // grant it presents would fail later checks too
        let fx = fixture(DomainScheme::SaltedV1);
        let forged = GrantIssuer::new(KeyPair::generate(), fx.domain)
            .issue(fx.delegate, 0)
            .unwrap();
        let stranger = Address::from_bytes([0x99; 20]);

        assert_eq!(
            fx.verifier_at(9_999).verify(stranger, &forged),
            Err(LedgerError::Unauthorized)
        );
    }

    #[test]
    fn authz_explicitly_disabled_caller_rejected() {
        let mut fx = fixture(DomainScheme::SaltedV1);
        fx.enabled.insert(fx.delegate, false);
        let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();

        assert_eq!(
            fx.verifier_at(500).verify(fx.delegate, &grant),
            Err(LedgerError::Unauthorized)
        );
    }

    #[test]
    fn authz_signature_check_precedes_expiry() {
        // Expired AND signed by a non-owner: the signature verdict wins
        let fx = fixture(DomainScheme::SaltedV1);
        let forged = GrantIssuer::new(KeyPair::generate(), fx.domain)
            .issue(fx.delegate, 10)
            .unwrap();

        assert_eq!(
            fx.verifier_at(9_999).verify(fx.delegate, &forged),
            Err(LedgerError::InvalidSignature)
        );
    }

    #[test]
    fn authz_non_owner_signer_rejected() {
        let fx = fixture(DomainScheme::TaggedV2);
        let forged = GrantIssuer::new(KeyPair::generate(), fx.domain)
            .issue(fx.delegate, 1_000)
            .unwrap();

        assert_eq!(
            fx.verifier_at(500).verify(fx.delegate, &forged),
            Err(LedgerError::InvalidSignature)
        );
    }

    #[test]
    fn authz_grant_bound_to_its_delegate() {
        // A second enabled identity cannot ride on the delegate's grant
        let mut fx = fixture(DomainScheme::SaltedV1);
        let other = Address::from_bytes([0x33; 20]);
        fx.enabled.insert(other, true);
        let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();

        assert_eq!(
            fx.verifier_at(500).verify(other, &grant),
            Err(LedgerError::InvalidSignature)
        );
    }

    #[test]
    fn authz_scheme_mismatch_is_typed() {
        // Grant issued under the tagged scheme, ledger pins salted; the
        // mismatch outranks the expiry it would also fail
        let fx = fixture(DomainScheme::SaltedV1);
        let tagged_domain =
            LedgerDomain::new(fx.domain.chain_id, fx.domain.ledger, DomainScheme::TaggedV2);
        let grant = GrantIssuer::new(fx.owner.clone(), tagged_domain)
            .issue(fx.delegate, 10)
            .unwrap();

        assert_eq!(
            fx.verifier_at(9_999).verify(fx.delegate, &grant),
            Err(LedgerError::SchemeMismatch {
                expected: DomainScheme::SaltedV1,
                got: DomainScheme::TaggedV2,
            })
        );
    }

    #[test]
    fn authz_verification_is_stateless() {
        // The same grant passes any number of times within its window
        let fx = fixture(DomainScheme::SaltedV1);
        let grant = fx.issuer().issue(fx.delegate, 1_000).unwrap();
        let verifier = fx.verifier_at(500);

        for _ in 0..3 {
            assert!(verifier.verify(fx.delegate, &grant).is_ok());
        }
    }
}
