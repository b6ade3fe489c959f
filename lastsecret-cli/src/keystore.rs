//! JSON key files for grant-signing keys
//!
//! The file holds the signing key as hex next to the address it signs as,
//! so a corrupted or hand-edited file is caught on load instead of
//! producing grants nobody can verify. In-memory copies are wiped on drop.

use anyhow::{bail, Context, Result};
use lastsecret_core::{Address, KeyPair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// On-disk form of a signing key
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyFile {
    /// Address the key signs as, stored for display and cross-checking
    #[zeroize(skip)]
    pub address: Address,
    /// Signing key bytes as 0x-prefixed hex
    secret_key: String,
}

impl KeyFile {
    /// Generate a fresh signing key
    pub fn generate() -> Self {
        let keys = KeyPair::generate();
        KeyFile {
            address: keys.address(),
            secret_key: format!("0x{}", hex::encode(keys.signing_key_bytes())),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        let file: KeyFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing key file {}", path.display()))?;
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("writing key file {}", path.display()))?;
        Ok(())
    }

    /// Reconstruct the key pair, cross-checking the stored address
    pub fn keypair(&self) -> Result<KeyPair> {
        let hex_part = self
            .secret_key
            .strip_prefix("0x")
            .unwrap_or(&self.secret_key);
        let decoded = hex::decode(hex_part).context("key file holds invalid hex")?;
        if decoded.len() != 32 {
            bail!("key file holds {} key bytes, expected 32", decoded.len());
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        let keys = KeyPair::from_signing_key_bytes(&bytes);
        bytes.zeroize();
        let keys = keys?;

        if keys.address() != self.address {
            bail!(
                "key file claims address {} but its key signs as {}",
                self.address,
                keys.address()
            );
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");

        let file = KeyFile::generate();
        file.save(&path).unwrap();

        let loaded = KeyFile::load(&path).unwrap();
        assert_eq!(loaded.address, file.address);
        assert_eq!(loaded.keypair().unwrap().address(), file.address);
    }

    #[test]
    fn test_tampered_address_is_caught() {
        let mut file = KeyFile::generate();
        file.address = Address::from_bytes([0; 20]);
        assert!(file.keypair().is_err());
    }

    #[test]
    fn test_key_file_stores_hex_secret() {
        let file = KeyFile::generate();
        let json = serde_json::to_value(&file).unwrap();
        assert!(json["secret_key"].as_str().unwrap().starts_with("0x"));
        assert_eq!(json["secret_key"].as_str().unwrap().len(), 66);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        fs::write(&path, "not json").unwrap();
        assert!(KeyFile::load(&path).is_err());
    }
}
