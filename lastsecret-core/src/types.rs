//! Core identity types for LastSecret

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

use crate::typed::keccak256;
use crate::{CoreError, Result};

/// 20-byte account identity derived from a secp256k1 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// Create from raw address bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Derive the address of a public key: trailing 20 bytes of the
    /// Keccak-256 hash of the uncompressed point, tag byte excluded
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Address(bytes)
    }

    /// Parse from `0x`-prefixed hex
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidAddress("missing 0x prefix".to_string()))?;

        let decoded = hex::decode(hex_part)
            .map_err(|e| CoreError::InvalidAddress(format!("invalid hex: {}", e)))?;
        if decoded.len() != Self::LEN {
            return Err(CoreError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                decoded.len()
            )));
        }

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }

    /// Get the raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Constant-time equality, for comparisons that gate authorization
    pub fn constant_time_eq(&self, other: &Address) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Address, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Random 256-bit value binding one salted grant to its domain separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; 32]);

impl Salt {
    /// Generate a fresh random salt
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Salt(bytes)
    }

    /// Create from raw salt bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Salt(bytes)
    }

    /// Parse from `0x`-prefixed hex
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidSalt("missing 0x prefix".to_string()))?;

        let decoded = hex::decode(hex_part)
            .map_err(|e| CoreError::InvalidSalt(format!("invalid hex: {}", e)))?;
        if decoded.len() != 32 {
            return Err(CoreError::InvalidSalt(format!(
                "expected 32 bytes, got {}",
                decoded.len()
            )));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Salt(bytes))
    }

    /// Get the raw salt bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Salt {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Salt::parse(s)
    }
}

impl Serialize for Salt {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Salt, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Salt::parse(&s).map_err(serde::de::Error::custom)
    }
}
