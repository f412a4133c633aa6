//! Ledger addresses
//!
//! Accounts and objects share one 32-byte address space. An object's id is
//! simply the address its record lives at.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size of an address in bytes
pub const ADDRESS_LENGTH: usize = 32;

/// 32-byte ledger address (account or object)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

/// Objects are addressed exactly like accounts.
pub type ObjectId = Address;

impl Address {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// Zero address
    pub const fn zero() -> Self {
        Address([0u8; ADDRESS_LENGTH])
    }

    /// Address with `value` in its low-order bytes (`0x1`, `0xcafe`, ...)
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 8..].copy_from_slice(&value.to_be_bytes());
        Address(bytes)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Full `0x`-prefixed lowercase hex
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse a hex literal; short forms such as `0xcafe` are left-padded.
    pub fn from_hex_literal(s: &str) -> Result<Self, AddressParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
        if digits.is_empty() || digits.len() > ADDRESS_LENGTH * 2 {
            return Err(AddressParseError::InvalidLength(digits.len()));
        }

        let padded = format!("{:0>width$}", digits, width = ADDRESS_LENGTH * 2);
        let bytes = hex::decode(padded)?;
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }

    /// Parse a base58 address
    pub fn from_base58(s: &str) -> Result<Self, AddressParseError> {
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressParseError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex_literal(s)
        } else {
            Self::from_base58(s)
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}...)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Address parsing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddressParseError {
    #[error("Hex address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Invalid address length: {0}")]
    InvalidLength(usize),

    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex_literal() {
        let addr = Address::from_hex_literal("0xcafe").unwrap();
        assert_eq!(addr, Address::from_u64(0xcafe));
        assert_eq!(addr.0[30], 0xca);
        assert_eq!(addr.0[31], 0xfe);
    }

    #[test]
    fn test_display_roundtrip() {
        let addr = Address::new([7u8; 32]);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);

        let parsed: Address = addr.to_base58().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Address::from_hex_literal("cafe").is_err());
        assert!(Address::from_hex_literal("0x").is_err());
        assert!(Address::from_hex_literal("0xzz").is_err());
        assert!(Address::from_hex_literal(&format!("0x{}", "1".repeat(65))).is_err());
    }

    #[test]
    fn test_canonical_encoding_is_raw_bytes() {
        let addr = Address::new([9u8; 32]);
        let encoded = bincode::serialize(&addr).unwrap();
        assert_eq!(encoded, addr.0.to_vec());
    }
}
