//! # Celereum Objects
//!
//! Ownership and capability layer for on-chain objects.
//!
//! ## Core Features
//! - Deterministic object addresses (SHA3-256, domain-separated schemes)
//! - Transferable ownership, including objects owned by other objects
//! - Capability refs for signing, deleting, extending and gating transfers
//! - Per-object GUIDs and event streams
//! - Atomic transaction execution over pluggable state and event backends

pub mod core;
pub mod crypto;
pub mod objects;
pub mod storage;

// Re-exports
pub use core::{Address, ObjectId, RuntimeConfig};
pub use crypto::Hash;
pub use objects::{
    CreatorRef, DeleteRef, ExtendRef, LinearTransferRef, MemoryExecutor, ObjectError,
    ObjectExecutor, OwnerRef, RefKind, RefVault, Session, Signer, StorableRef, TransferRef,
    TypedOwnerRef,
};
pub use storage::{MemoryStateStore, StateStore};
