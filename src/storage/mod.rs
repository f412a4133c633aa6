//! State storage for Celereum objects
//!
//! The persistence engine belongs to the host; this module defines the
//! keyed-state interface the object runtime reads through, the change sets
//! it produces, and an in-memory backend.

pub mod state;

pub use state::{ChangeSet, MemoryStateStore, ResourceGroup, StateKey, StateStore, WriteOp};
