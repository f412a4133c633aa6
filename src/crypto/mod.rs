//! Cryptographic primitives for Celereum objects
//!
//! Object addresses are SHA3-256 digests; state fingerprints use SHA-256.

pub mod hash;

pub use hash::Hash;
