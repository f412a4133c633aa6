//! Object records and resources
//!
//! Every object keeps an [`ObjectRecord`] at its own address, next to
//! whatever resources were published there. The record, not the owner's
//! account, is where ownership lives, so object data stays put while its
//! owner changes.

use super::event::{Event, EventHandle};
use super::guid::Guid;
use crate::core::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Prefix of type tags owned by the object framework itself
pub const FRAMEWORK_NAMESPACE: &str = "celereum::framework::";

/// A value that can be published at an address.
///
/// At most one value per (address, type tag) exists at any time.
pub trait Resource: Serialize + DeserializeOwned {
    /// Stable storage key of this type. Must not start with
    /// [`FRAMEWORK_NAMESPACE`].
    const TYPE_TAG: &'static str;
}

/// Per-object ownership metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Next creation number for GUIDs issued by this object
    pub(crate) guid_creation_num: u64,
    /// Current owner (account or object)
    pub(crate) owner: Address,
    /// Whether the owner may transfer without a transfer ref
    pub(crate) allow_ungated_transfer: bool,
    pub(crate) transfer_events: EventHandle<TransferEvent>,
}

impl ObjectRecord {
    pub(crate) const TYPE_TAG: &'static str = "celereum::framework::object::ObjectRecord";

    /// Fresh record owned by `owner`, with the GUID counter resuming at
    /// `guid_creation_num` (0 for an address never used before). The
    /// transfer-event stream takes the first GUID.
    pub(crate) fn new(object: Address, owner: Address, mut guid_creation_num: u64) -> Self {
        let transfer_events_guid = Guid::create(object, &mut guid_creation_num);
        Self {
            guid_creation_num,
            owner,
            allow_ungated_transfer: true,
            transfer_events: EventHandle::new(transfer_events_guid),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn allows_ungated_transfer(&self) -> bool {
        self.allow_ungated_transfer
    }

    pub fn guid_creation_num(&self) -> u64 {
        self.guid_creation_num
    }

    pub fn transfer_events(&self) -> &EventHandle<TransferEvent> {
        &self.transfer_events
    }
}

/// GUID counter left behind when an object is deleted, so a later object at
/// the same address never reissues its GUIDs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RetiredObject {
    pub(crate) guid_creation_num: u64,
}

impl RetiredObject {
    pub(crate) const TYPE_TAG: &'static str = "celereum::framework::object::RetiredObject";
}

/// Emitted on every ownership change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub object: Address,
    pub from: Address,
    pub to: Address,
}

impl Event for TransferEvent {
    const TYPE_TAG: &'static str = "celereum::framework::object::TransferEvent";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record() {
        let object = Address::from_u64(0xabc);
        let owner = Address::from_u64(0xcafe);
        let record = ObjectRecord::new(object, owner, 0);

        assert_eq!(record.owner(), owner);
        assert!(record.allows_ungated_transfer());
        assert_eq!(record.guid_creation_num(), 1);
        assert_eq!(record.transfer_events().counter(), 0);
        assert_eq!(record.transfer_events().guid().addr, object);
        assert_eq!(record.transfer_events().guid().creation_num, 0);
    }

    #[test]
    fn test_framework_tags_are_namespaced() {
        assert!(ObjectRecord::TYPE_TAG.starts_with(FRAMEWORK_NAMESPACE));
        assert!(TransferEvent::TYPE_TAG.starts_with(FRAMEWORK_NAMESPACE));
        assert!(RetiredObject::TYPE_TAG.starts_with(FRAMEWORK_NAMESPACE));
    }

    #[test]
    fn test_record_resumes_counter() {
        let object = Address::from_u64(0xabc);
        let record = ObjectRecord::new(object, Address::from_u64(1), 5);

        assert_eq!(record.transfer_events().guid().creation_num, 5);
        assert_eq!(record.guid_creation_num(), 6);
    }
}
