//! Structured-data hashing primitives
//!
//! Grants are signed over a canonical byte encoding rather than ad-hoc
//! concatenation: every record hashes as keccak256(type_hash || fields),
//! each field is encoded as one 32-byte word, and dynamic strings are
//! first hashed down to a single word. The final signing digest prefixes
//! the domain and message hashes with the two bytes 0x19 0x01 so it can
//! never collide with a plain signed payload.
//!
//! Field order inside a type declaration is part of the wire contract.
//! Reordering fields or renaming a type invalidates every signature ever
//! issued under it.

use sha3::{Digest, Keccak256};

use crate::types::Address;

/// Keccak-256 hash of arbitrary bytes
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a type declaration string into its type hash
pub fn type_hash(declaration: &str) -> [u8; 32] {
    keccak256(declaration.as_bytes())
}

/// Encode a string field: dynamic data is carried as its hash
pub fn string_word(value: &str) -> [u8; 32] {
    keccak256(value.as_bytes())
}

/// Encode an address as one left-padded 32-byte word
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Encode an unsigned integer as a big-endian uint256 word
pub fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Hash one record: keccak256(type_hash || word_0 || word_1 || ...)
pub fn hash_struct(type_hash: [u8; 32], words: &[[u8; 32]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(type_hash);
    for word in words {
        hasher.update(word);
    }
    hasher.finalize().into()
}

/// Final signing digest: keccak256(0x19 || 0x01 || domain || message)
pub fn digest(domain_separator: [u8; 32], message_hash: [u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update([0x19, 0x01]);
    hasher.update(domain_separator);
    hasher.update(message_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_uint_word_is_big_endian_padded() {
        let word = uint_word(0x0102);
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
    }

    #[test]
    fn test_address_word_left_pads() {
        let address = Address::from_bytes([0xee; 20]);
        let word = address_word(&address);
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], address.as_bytes());
    }

    #[test]
    fn test_hash_struct_matches_manual_concatenation() {
        let th = type_hash("User(address user,uint256 expiresAt)");
        let user = address_word(&Address::from_bytes([3; 20]));
        let expires = uint_word(1_700_000_000);

        let mut manual = Vec::new();
        manual.extend_from_slice(&th);
        manual.extend_from_slice(&user);
        manual.extend_from_slice(&expires);

        assert_eq!(hash_struct(th, &[user, expires]), keccak256(&manual));
    }

    #[test]
    fn test_digest_prefix_separates_from_raw_hash() {
        let domain = [1u8; 32];
        let message = [2u8; 32];

        let mut raw = Vec::new();
        raw.extend_from_slice(&domain);
        raw.extend_from_slice(&message);

        // The 0x19 0x01 prefix must be present in the digest preimage
        assert_ne!(digest(domain, message), keccak256(&raw));
    }

    #[test]
    fn test_digest_depends_on_both_inputs() {
        let base = digest([1; 32], [2; 32]);
        assert_ne!(base, digest([3; 32], [2; 32]));
        assert_ne!(base, digest([1; 32], [4; 32]));
    }
}
