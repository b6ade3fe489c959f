//! Recoverable ECDSA signatures
//!
//! Grants carry a 65-byte secp256k1 signature in r || s || v order. No
//! public key travels with it: verification recovers the signer's address
//! from the digest and the recovery byte, then compares it to the expected
//! owner. The v byte is accepted as 0/1 or the Ethereum-conventional
//! 27/28 and normalized on parse.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Address;
use crate::{CoreError, Result};

/// Wire length of one signature: 32-byte r, 32-byte s, one v byte
pub const SIGNATURE_LEN: usize = 65;

/// A secp256k1 signature carrying enough information to recover its signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: EcdsaSignature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    pub(crate) fn new(signature: EcdsaSignature, recovery_id: RecoveryId) -> Self {
        RecoverableSignature {
            signature,
            recovery_id,
        }
    }

    /// Parse the 65-byte wire form.
    ///
    /// High-s signatures are rejected so every grant has exactly one
    /// accepted encoding; a v byte outside {0, 1, 27, 28} is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CoreError::MalformedSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }

        let signature = EcdsaSignature::from_slice(&bytes[..64])
            .map_err(|e| CoreError::MalformedSignature(e.to_string()))?;
        if signature.normalize_s().is_some() {
            return Err(CoreError::MalformedSignature(
                "non-canonical s value".to_string(),
            ));
        }

        let v = bytes[64];
        let recovery_byte = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            other => {
                return Err(CoreError::MalformedSignature(format!(
                    "invalid recovery byte {}",
                    other
                )))
            }
        };
        let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or_else(|| {
            CoreError::MalformedSignature(format!("invalid recovery byte {}", v))
        })?;

        Ok(RecoverableSignature {
            signature,
            recovery_id,
        })
    }

    /// Wire form with v encoded as 27/28
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&self.signature.to_bytes());
        out[64] = self.recovery_id.to_byte() + 27;
        out
    }

    /// Recover the address that signed the given 32-byte digest
    pub fn recover(&self, digest: &[u8; 32]) -> Result<Address> {
        let key = VerifyingKey::recover_from_prehash(digest, &self.signature, self.recovery_id)
            .map_err(|_| CoreError::RecoveryFailed)?;
        Ok(Address::from_verifying_key(&key))
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for RecoverableSignature {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::MalformedSignature("missing 0x prefix".to_string()))?;
        let decoded = hex::decode(hex_part)
            .map_err(|e| CoreError::MalformedSignature(format!("invalid hex: {}", e)))?;
        RecoverableSignature::from_bytes(&decoded)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<RecoverableSignature, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
