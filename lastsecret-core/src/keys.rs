//! secp256k1 key management
//!
//! Key generation and digest signing for grant issuance. Signatures are
//! produced directly over 32-byte digests and carry a recovery id, so
//! verifiers never need the public key on the wire.

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;

use crate::signature::RecoverableSignature;
use crate::types::Address;
use crate::{CoreError, Result};

/// secp256k1 key pair for signing grants
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Create key pair from signing key bytes
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        let verifying_key = *signing_key.verifying_key();

        Ok(KeyPair {
            signing_key,
            verifying_key,
        })
    }

    /// Get the verifying key
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get signing key bytes (sensitive operation)
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// The address this key pair signs as
    pub fn address(&self) -> Address {
        Address::from_verifying_key(&self.verifying_key)
    }

    /// Sign a 32-byte digest, producing a recoverable signature
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CoreError::SigningFailed(e.to_string()))?;

        Ok(RecoverableSignature::new(signature, recovery_id))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
