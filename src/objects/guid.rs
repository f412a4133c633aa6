//! Globally unique identifiers
//!
//! A GUID is the pair (creator address, creation number). Creation numbers
//! come from a per-address monotonic counter, so two GUIDs never collide.

use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The identifying part of a GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuidId {
    /// Value of the creator's counter when this id was issued
    pub creation_num: u64,
    /// Address that issued the id
    pub addr: Address,
}

impl GuidId {
    pub fn new(addr: Address, creation_num: u64) -> Self {
        Self { creation_num, addr }
    }

    /// Canonical encoding: little-endian creation number, then the address.
    /// Matches the bincode encoding of this struct.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 32);
        bytes.extend_from_slice(&self.creation_num.to_le_bytes());
        bytes.extend_from_slice(self.addr.as_bytes());
        bytes
    }
}

impl fmt::Display for GuidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.addr, self.creation_num)
    }
}

/// A freshly issued unique identifier.
///
/// Not `Clone`: each GUID is consumed by whatever it is minted for
/// (an event handle, an object address).
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guid {
    id: GuidId,
}

impl Guid {
    /// Issue a GUID and advance the issuer's counter
    pub(crate) fn create(addr: Address, creation_num_ref: &mut u64) -> Self {
        let creation_num = *creation_num_ref;
        *creation_num_ref += 1;
        Self {
            id: GuidId::new(addr, creation_num),
        }
    }

    pub fn id(&self) -> GuidId {
        self.id
    }

    pub fn creator_address(&self) -> Address {
        self.id.addr
    }

    pub fn creation_num(&self) -> u64 {
        self.id.creation_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_advances_counter() {
        let addr = Address::from_u64(0xcafe);
        let mut counter = 0;

        let first = Guid::create(addr, &mut counter);
        let second = Guid::create(addr, &mut counter);

        assert_eq!(first.creation_num(), 0);
        assert_eq!(second.creation_num(), 1);
        assert_eq!(counter, 2);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.creator_address(), addr);
    }

    #[test]
    fn test_canonical_bytes_match_bincode() {
        let id = GuidId::new(Address::new([3u8; 32]), 0x0102_0304);
        assert_eq!(id.to_canonical_bytes(), bincode::serialize(&id).unwrap());
    }
}
