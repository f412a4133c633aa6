//! Hash types for Celereum objects
//!
//! Object addresses are SHA3-256 digests (the ledger's address hash);
//! content digests such as resource-group fingerprints use SHA-256.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use std::fmt;

/// 32-byte hash used throughout Celereum
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create a new hash from bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Create a zero hash
    pub fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Check if this is a zero hash
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hash arbitrary data using SHA256
    pub fn hash(data: &[u8]) -> Self {
        Self::hash_multiple(&[data])
    }

    /// Hash multiple pieces of data using SHA256
    pub fn hash_multiple(data: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for d in data {
            hasher.update(d);
        }
        Hash(hasher.finalize().into())
    }

    /// Hash arbitrary data using SHA3-256 (address derivation)
    pub fn sha3_256(data: &[u8]) -> Self {
        Self::sha3_256_multiple(&[data])
    }

    /// SHA3-256 over the concatenation of `data`
    pub fn sha3_256_multiple(data: &[&[u8]]) -> Self {
        let mut hasher = Sha3_256::new();
        for d in data {
            hasher.update(d);
        }
        Hash(hasher.finalize().into())
    }

    /// Get the bytes of the hash
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to base58 string
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash() {
        let hash = Hash::hash(b"hello celereum");
        assert_ne!(hash, Hash::zero());
    }

    #[test]
    fn test_sha3_differs_from_sha256() {
        assert_ne!(Hash::sha3_256(b"object"), Hash::hash(b"object"));
    }

    #[test]
    fn test_sha3_known_vector() {
        // SHA3-256("")
        assert_eq!(
            Hash::sha3_256(b"").to_hex(),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_multiple_is_concatenation() {
        assert_eq!(
            Hash::sha3_256_multiple(&[b"ab", b"cd"]),
            Hash::sha3_256(b"abcd")
        );
        assert_eq!(Hash::hash_multiple(&[b"ab", b"cd"]), Hash::hash(b"abcd"));
    }
}
