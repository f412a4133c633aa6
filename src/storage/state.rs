//! Global keyed state
//!
//! Resources live at addresses: the state maps (address, type tag) to the
//! resource's encoded bytes. All resources at one address form a resource
//! group that is created by its first write and dropped with its last.
//!
//! Transactions never write to a store directly. They accumulate a
//! [`ChangeSet`] which the executor applies in one step on commit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::Address;
use crate::crypto::Hash;

/// Storage key of one resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub address: Address,
    pub type_tag: String,
}

impl StateKey {
    pub fn new(address: Address, type_tag: impl Into<String>) -> Self {
        Self {
            address,
            type_tag: type_tag.into(),
        }
    }
}

/// A pending write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put(Vec<u8>),
    Delete,
}

/// Writes buffered by one transaction
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    writes: BTreeMap<StateKey, WriteOp>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending write for `key`, if any
    pub fn get(&self, key: &StateKey) -> Option<&WriteOp> {
        self.writes.get(key)
    }

    pub fn put(&mut self, key: StateKey, value: Vec<u8>) {
        self.writes.insert(key, WriteOp::Put(value));
    }

    pub fn delete(&mut self, key: StateKey) {
        self.writes.insert(key, WriteOp::Delete);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> impl Iterator<Item = (StateKey, WriteOp)> {
        self.writes.into_iter()
    }
}

/// Host state backend
pub trait StateStore {
    /// Encoded resource at `key`
    fn get(&self, key: &StateKey) -> Option<Vec<u8>>;

    /// Apply a committed change set
    fn apply(&mut self, changes: ChangeSet);

    fn contains(&self, key: &StateKey) -> bool {
        self.get(key).is_some()
    }
}

/// All resources stored at one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    resources: BTreeMap<String, Vec<u8>>,
}

impl ResourceGroup {
    pub fn get(&self, type_tag: &str) -> Option<&Vec<u8>> {
        self.resources.get(type_tag)
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.resources.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// In-memory state store for testing
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    groups: BTreeMap<Address, ResourceGroup>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource group at `address`
    pub fn group(&self, address: &Address) -> Option<&ResourceGroup> {
        self.groups.get(address)
    }

    /// Number of addresses holding at least one resource
    pub fn address_count(&self) -> usize {
        self.groups.len()
    }

    /// SHA-256 fingerprint of the whole state. Entries are fed in key
    /// order, each field length-prefixed.
    pub fn digest(&self) -> Hash {
        let mut hasher = Sha256::new();
        for (address, group) in &self.groups {
            hasher.update(address.as_bytes());
            hasher.update((group.resources.len() as u64).to_le_bytes());
            for (type_tag, value) in &group.resources {
                hasher.update((type_tag.len() as u64).to_le_bytes());
                hasher.update(type_tag.as_bytes());
                hasher.update((value.len() as u64).to_le_bytes());
                hasher.update(value);
            }
        }
        Hash::new(hasher.finalize().into())
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &StateKey) -> Option<Vec<u8>> {
        self.groups
            .get(&key.address)
            .and_then(|group| group.get(&key.type_tag))
            .cloned()
    }

    fn apply(&mut self, changes: ChangeSet) {
        for (key, op) in changes.into_writes() {
            match op {
                WriteOp::Put(value) => {
                    self.groups
                        .entry(key.address)
                        .or_default()
                        .resources
                        .insert(key.type_tag, value);
                }
                WriteOp::Delete => {
                    if let Some(group) = self.groups.get_mut(&key.address) {
                        group.resources.remove(&key.type_tag);
                        if group.is_empty() {
                            self.groups.remove(&key.address);
                        }
                    }
                }
            }
        }
    }
}
