//! Object address derivation
//!
//! Object addresses are `sha3_256(input || scheme)` where the trailing
//! scheme byte keeps every derivation family in its own address space:
//!
//! | Scheme | Input |
//! |--------|-------|
//! | `0xFD` | canonical bytes of a [`GuidId`] (anonymous objects) |
//! | `0xFE` | creator address followed by a user seed (named objects) |
//! | `0xFC` | address of a deleted object (its retired GUID counter) |
//! | `0xFF` | creator address followed by a seed (resource accounts) |

use super::guid::GuidId;
use crate::core::Address;
use crate::crypto::Hash;

/// Scheme byte for the place a deleted object's GUID counter is kept
pub const RETIRED_OBJECT_ADDRESS_SCHEME: u8 = 0xFC;

/// Scheme byte for objects derived from a GUID
pub const OBJECT_FROM_GUID_ADDRESS_SCHEME: u8 = 0xFD;

/// Scheme byte for objects derived from (creator, seed)
pub const OBJECT_FROM_SEED_ADDRESS_SCHEME: u8 = 0xFE;

/// Scheme byte the ledger uses for resource accounts
pub const RESOURCE_ADDRESS_SCHEME: u8 = 0xFF;

/// Derive the address of a named object
pub fn create_object_address(creator: &Address, seed: &[u8]) -> Address {
    derive(&[creator.as_bytes(), seed], OBJECT_FROM_SEED_ADDRESS_SCHEME)
}

/// Derive the address of an anonymous object from a GUID
pub fn create_object_address_from_guid(id: &GuidId) -> Address {
    derive(&[&id.to_canonical_bytes()], OBJECT_FROM_GUID_ADDRESS_SCHEME)
}

/// Derive a resource-account address. Never yields an object address for
/// the same inputs.
pub fn create_resource_address(source: &Address, seed: &[u8]) -> Address {
    derive(&[source.as_bytes(), seed], RESOURCE_ADDRESS_SCHEME)
}

/// Where the GUID counter of a deleted object at `object` is retired to.
/// Kept outside the object's own group so deletion can drop that group.
pub fn create_retired_object_address(object: &Address) -> Address {
    derive(&[object.as_bytes()], RETIRED_OBJECT_ADDRESS_SCHEME)
}

fn derive(parts: &[&[u8]], scheme: u8) -> Address {
    let scheme = [scheme];
    let mut input: Vec<&[u8]> = parts.to_vec();
    input.push(&scheme);
    Address::new(*Hash::sha3_256_multiple(&input).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sha3::{Digest, Sha3_256};

    #[test]
    fn test_named_address_layout() {
        let creator = Address::from_u64(0xcafe);
        let seed = b"Hero Quest!::jade";

        let mut hasher = Sha3_256::new();
        hasher.update(creator.as_bytes());
        hasher.update(seed);
        hasher.update([OBJECT_FROM_SEED_ADDRESS_SCHEME]);
        let expected: [u8; 32] = hasher.finalize().into();

        assert_eq!(create_object_address(&creator, seed), Address::new(expected));
    }

    #[test]
    fn test_guid_address_uses_own_scheme() {
        let creator = Address::from_u64(0x1);
        let id = GuidId::new(creator, 0);

        let mut hasher = Sha3_256::new();
        hasher.update(id.to_canonical_bytes());
        hasher.update([OBJECT_FROM_GUID_ADDRESS_SCHEME]);
        let expected: [u8; 32] = hasher.finalize().into();

        assert_eq!(create_object_address_from_guid(&id), Address::new(expected));
        assert_ne!(
            create_object_address_from_guid(&GuidId::new(creator, 1)),
            Address::new(expected)
        );
    }

    #[test]
    fn test_retired_address_is_not_a_named_address() {
        let object = Address::from_u64(0x0b1);
        let retired = create_retired_object_address(&object);
        assert_ne!(retired, object);
        // Empty seed: same input bytes, different scheme.
        assert_ne!(retired, create_object_address(&object, b""));
    }

    #[test]
    fn test_seed_boundaries_matter() {
        let a = Address::from_u64(1);
        let b = Address::from_u64(2);
        assert_ne!(create_object_address(&a, b"x"), create_object_address(&b, b"x"));
        assert_ne!(create_object_address(&a, b"x"), create_object_address(&a, b"y"));
    }

    proptest! {
        #[test]
        fn prop_derivation_is_deterministic(
            creator in any::<[u8; 32]>(),
            seed in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let creator = Address::new(creator);
            prop_assert_eq!(
                create_object_address(&creator, &seed),
                create_object_address(&creator, &seed)
            );
        }

        #[test]
        fn prop_object_and_resource_schemes_are_disjoint(
            creators in prop::collection::vec(any::<[u8; 32]>(), 1..8),
            seeds in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..8),
        ) {
            let mut objects = std::collections::HashSet::new();
            let mut resources = std::collections::HashSet::new();
            for creator in &creators {
                let creator = Address::new(*creator);
                for seed in &seeds {
                    objects.insert(create_object_address(&creator, seed));
                    resources.insert(create_resource_address(&creator, seed));
                }
            }
            prop_assert!(objects.is_disjoint(&resources));
        }

        #[test]
        fn prop_guid_and_seed_schemes_are_disjoint(
            creator in any::<[u8; 32]>(),
            creation_num in any::<u64>(),
        ) {
            let creator = Address::new(creator);
            let id = GuidId::new(creator, creation_num);
            // Feed the GUID bytes as a seed: only the scheme byte differs.
            let as_seed = create_object_address(&creator, &id.to_canonical_bytes());
            prop_assert_ne!(create_object_address_from_guid(&id), as_seed);
        }
    }
}
