//! Transaction session
//!
//! A [`Session`] is the object runtime as seen from inside one transaction.
//! It reads through the host state, buffers every write in a [`ChangeSet`]
//! and every event in a pending list, and hands both back to the executor
//! when the transaction finishes. Nothing reaches the store unless the
//! whole transaction succeeds.
//!
//! Object lifecycle:
//!
//! ```text
//! NonExistent --create--> Active --transfer / transfer_with_ref--> Active
//!                            |
//!                            +--delete(DeleteRef)--> Deleted
//! ```
//!
//! A deleted object's GUID counter is parked at its retired address. The
//! address then stops issuing GUIDs until an object is created there again,
//! and the new record picks the counter back up.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::derive::{
    create_object_address, create_object_address_from_guid, create_retired_object_address,
};
use super::error::{ObjectError, Result};
use super::event::{EmittedEvent, Event, EventHandle};
use super::guid::Guid;
use super::object::{ObjectRecord, Resource, RetiredObject, TransferEvent, FRAMEWORK_NAMESPACE};
use super::refs::{
    Capability, CreatorRef, DeleteRef, ExtendRef, LinearTransferRef, OwnerRef, Signer,
    TransferRef, TypedOwnerRef,
};
use crate::core::{Account, AccountProvider, Address, RuntimeConfig};
use crate::storage::{ChangeSet, StateKey, StateStore, WriteOp};

/// Object runtime bound to one transaction
pub struct Session<'a> {
    state: &'a dyn StateStore,
    accounts: &'a dyn AccountProvider,
    config: &'a RuntimeConfig,
    changes: ChangeSet,
    events: Vec<EmittedEvent>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        state: &'a dyn StateStore,
        accounts: &'a dyn AccountProvider,
        config: &'a RuntimeConfig,
    ) -> Self {
        Self {
            state,
            accounts,
            config,
            changes: ChangeSet::new(),
            events: Vec::new(),
        }
    }

    /// Writes and events produced so far
    pub(crate) fn into_effects(self) -> (ChangeSet, Vec<EmittedEvent>) {
        (self.changes, self.events)
    }

    pub fn config(&self) -> &RuntimeConfig {
        self.config
    }

    /// Events emitted by this transaction so far
    pub fn pending_events(&self) -> &[EmittedEvent] {
        &self.events
    }

    // =========================================================================
    // Raw state access
    // =========================================================================

    fn read_raw(&self, key: &StateKey) -> Option<Vec<u8>> {
        match self.changes.get(key) {
            Some(WriteOp::Put(value)) => Some(value.clone()),
            Some(WriteOp::Delete) => None,
            None => self.state.get(key),
        }
    }

    fn has_raw(&self, key: &StateKey) -> bool {
        match self.changes.get(key) {
            Some(WriteOp::Put(_)) => true,
            Some(WriteOp::Delete) => false,
            None => self.state.contains(key),
        }
    }

    pub(super) fn load<T: DeserializeOwned>(
        &self,
        address: Address,
        type_tag: &str,
    ) -> Result<Option<T>> {
        match self.read_raw(&StateKey::new(address, type_tag)) {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(super) fn save<T: Serialize>(
        &mut self,
        address: Address,
        type_tag: &str,
        value: &T,
    ) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        self.changes.put(StateKey::new(address, type_tag), bytes);
        Ok(())
    }

    pub(super) fn has(&self, address: Address, type_tag: &str) -> bool {
        self.has_raw(&StateKey::new(address, type_tag))
    }

    pub(super) fn erase(&mut self, address: Address, type_tag: &str) {
        self.changes.delete(StateKey::new(address, type_tag));
    }

    // =========================================================================
    // Object records
    // =========================================================================

    /// Whether an object record exists at `object`
    pub fn exists_at(&self, object: Address) -> bool {
        self.has_raw(&StateKey::new(object, ObjectRecord::TYPE_TAG))
    }

    /// Snapshot of the record at `object`
    pub fn record(&self, object: Address) -> Result<ObjectRecord> {
        self.load(object, ObjectRecord::TYPE_TAG)?
            .ok_or(ObjectError::ObjectDoesNotExist(object))
    }

    fn save_record(&mut self, object: Address, record: &ObjectRecord) -> Result<()> {
        self.save(object, ObjectRecord::TYPE_TAG, record)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a permanent object at `derive(creator, seed)`
    pub fn create_named_object(&mut self, creator: &Signer, seed: &[u8]) -> Result<CreatorRef> {
        self.create_object(creator, seed, false)
    }

    /// Create an object at `derive(creator, seed)`. With `can_delete` the
    /// creator ref can mint delete refs; once deleted, the same seed can be
    /// used again.
    pub fn create_object(
        &mut self,
        creator: &Signer,
        seed: &[u8],
        can_delete: bool,
    ) -> Result<CreatorRef> {
        let creator_address = creator.address();
        let object = create_object_address(&creator_address, seed);
        self.create_object_internal(creator_address, object, can_delete)
    }

    /// Create an anonymous, deletable object from a fresh GUID of the
    /// creator. An object's signer draws from the object's own counter.
    pub fn create_object_from_account(&mut self, creator: &Signer) -> Result<CreatorRef> {
        let guid = self.issue_guid(creator.address())?;
        self.create_object_from_guid(creator.address(), guid)
    }

    /// Create an anonymous, deletable object from a fresh GUID of the
    /// creating object. `creator` must be an object's signer.
    pub fn create_object_from_object(&mut self, creator: &Signer) -> Result<CreatorRef> {
        let guid = self.create_object_guid(creator.address())?;
        self.create_object_from_guid(creator.address(), guid)
    }

    fn create_object_from_guid(&mut self, creator: Address, guid: Guid) -> Result<CreatorRef> {
        let object = create_object_address_from_guid(&guid.id());
        self.create_object_internal(creator, object, true)
    }

    /// Publish a fresh record at `object`, owned by `creator`
    pub(crate) fn create_object_internal(
        &mut self,
        creator: Address,
        object: Address,
        can_delete: bool,
    ) -> Result<CreatorRef> {
        if self.exists_at(object) {
            return Err(ObjectError::ObjectExists(object));
        }

        let guid_creation_num = self.take_retired_counter(object)?;
        let object_signer = self.accounts.create_signer(object);
        let record = ObjectRecord::new(object, creator, guid_creation_num);
        self.save_record(object_signer.address(), &record)?;

        info!(%object, owner = %creator, can_delete, "created object");
        Ok(CreatorRef::new(object, can_delete))
    }

    /// Counter a new object at `object` starts from: whatever a deleted
    /// predecessor or an account at that address already handed out.
    /// Both are folded into the new record.
    fn take_retired_counter(&mut self, object: Address) -> Result<u64> {
        let retired_at = create_retired_object_address(&object);
        let mut guid_creation_num = 0;

        if let Some(retired) = self.load::<RetiredObject>(retired_at, RetiredObject::TYPE_TAG)? {
            guid_creation_num = retired.guid_creation_num;
            self.erase(retired_at, RetiredObject::TYPE_TAG);
        }
        if let Some(account) = self.load::<Account>(object, Account::TYPE_TAG)? {
            guid_creation_num = guid_creation_num.max(account.guid_creation_num);
            self.erase(object, Account::TYPE_TAG);
        }

        if guid_creation_num > 0 {
            debug!(%object, guid_creation_num, "resumed guid counter");
        }
        Ok(guid_creation_num)
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Signer of the object behind `creator_ref`, derived on every call
    pub fn generate_signer(&self, creator_ref: &CreatorRef) -> Signer {
        self.accounts.create_signer(creator_ref.object_address())
    }

    /// Signer of the object behind `extend_ref`, derived on every call
    pub fn generate_signer_for_extending(&self, extend_ref: &ExtendRef) -> Signer {
        self.accounts.create_signer(extend_ref.object_address())
    }

    /// Mint a single-use transfer authorization bound to the current owner
    pub fn generate_linear_transfer_ref(
        &self,
        transfer_ref: &TransferRef,
    ) -> Result<LinearTransferRef> {
        let owner = self.owner(transfer_ref.object_address())?;
        debug!(object = %transfer_ref.object_address(), %owner, "minted linear transfer ref");
        Ok(transfer_ref.linear(owner))
    }

    /// Permanently require a transfer ref to move the object
    pub fn disallow_ungated_transfer(&mut self, transfer_ref: &TransferRef) -> Result<()> {
        let object = transfer_ref.object_address();
        let mut record = self.record(object)?;
        record.allow_ungated_transfer = false;
        self.save_record(object, &record)?;

        info!(%object, "disabled ungated transfer");
        Ok(())
    }

    // =========================================================================
    // GUIDs and events
    // =========================================================================

    /// Issue a GUID from the signer's counter (object or account)
    pub fn create_guid(&mut self, signer: &Signer) -> Result<Guid> {
        self.issue_guid(signer.address())
    }

    /// Live objects use their record's counter. A deleted object's address
    /// issues nothing, so a leftover signer can't replay its GUIDs.
    fn issue_guid(&mut self, address: Address) -> Result<Guid> {
        if self.exists_at(address) {
            return self.create_object_guid(address);
        }
        if self.has(create_retired_object_address(&address), RetiredObject::TYPE_TAG) {
            return Err(ObjectError::ObjectDoesNotExist(address));
        }
        self.create_account_guid(address)
    }

    fn create_object_guid(&mut self, object: Address) -> Result<Guid> {
        let mut record = self.record(object)?;
        let guid = Guid::create(object, &mut record.guid_creation_num);
        self.save_record(object, &record)?;

        debug!(guid = %guid.id(), "issued object guid");
        Ok(guid)
    }

    fn create_account_guid(&mut self, account: Address) -> Result<Guid> {
        let mut state: Account = self.load(account, Account::TYPE_TAG)?.unwrap_or_default();
        let guid = Guid::create(account, &mut state.guid_creation_num);
        self.save(account, Account::TYPE_TAG, &state)?;

        debug!(guid = %guid.id(), "issued account guid");
        Ok(guid)
    }

    /// New event stream owned by the signer's address
    pub fn new_event_handle<E: Event>(&mut self, signer: &Signer) -> Result<EventHandle<E>> {
        Ok(EventHandle::new(self.create_guid(signer)?))
    }

    /// Append `event` to `handle`'s stream
    pub fn emit<E: Event>(&mut self, handle: &mut EventHandle<E>, event: E) -> Result<()> {
        let emitted = handle.record(&event)?;
        self.events.push(emitted);
        Ok(())
    }

    /// Retire an event stream
    pub fn destroy_handle<E>(&mut self, handle: EventHandle<E>) {
        debug!(guid = %handle.guid(), emitted = handle.counter(), "destroyed event handle");
    }

    // =========================================================================
    // Ownership queries
    // =========================================================================

    pub fn owner(&self, object: Address) -> Result<Address> {
        Ok(self.record(object)?.owner)
    }

    pub fn is_owner(&self, object: Address, owner: Address) -> Result<bool> {
        Ok(self.owner(object)? == owner)
    }

    /// Whether `owner` is `object` itself or an ancestor of it
    pub fn owns(&self, object: Address, owner: Address) -> Result<bool> {
        if object == owner {
            return Ok(true);
        }

        let limit = self.config.max_nesting_depth;
        let mut current = self.owner(object)?;
        let mut hops = 0u32;
        while current != owner {
            hops += 1;
            if hops > limit {
                return Err(ObjectError::MaximumNesting { object, limit });
            }
            match self.load::<ObjectRecord>(current, ObjectRecord::TYPE_TAG)? {
                Some(record) => current = record.owner,
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn allows_ungated_transfer(&self, object: Address) -> Result<bool> {
        Ok(self.record(object)?.allow_ungated_transfer)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Move `object` to `to` on the authority of `owner`.
    ///
    /// `owner` must be the object's owner or an ancestor of it, and every
    /// object from `object` up to `owner` must allow ungated transfer.
    /// Transferring to the current owner changes nothing.
    pub fn transfer(&mut self, owner: &Signer, object: Address, to: Address) -> Result<()> {
        self.verify_ungated_and_descendant(owner.address(), object)?;
        self.transfer_raw(object, to)
    }

    /// As [`Session::transfer`], but `to` must be an existing object
    pub fn transfer_to_object(
        &mut self,
        owner: &Signer,
        object: Address,
        to_object: Address,
    ) -> Result<()> {
        if !self.exists_at(to_object) {
            return Err(ObjectError::ObjectDoesNotExist(to_object));
        }
        self.transfer(owner, object, to_object)
    }

    /// Transfer without the ungated-transfer check. Consumes the ref; fails
    /// if the object changed hands since the ref was minted.
    pub fn transfer_with_ref(
        &mut self,
        transfer_ref: LinearTransferRef,
        to: Address,
    ) -> Result<()> {
        let object = transfer_ref.object_address();
        if self.owner(object)? != transfer_ref.owner() {
            return Err(ObjectError::NotObjectOwner {
                object,
                caller: transfer_ref.owner(),
            });
        }
        self.transfer_raw(object, to)
    }

    fn transfer_raw(&mut self, object: Address, to: Address) -> Result<()> {
        let mut record = self.record(object)?;
        let from = record.owner;
        if from == to {
            return Ok(());
        }

        let event = record
            .transfer_events
            .record(&TransferEvent { object, from, to })?;
        self.events.push(event);
        record.owner = to;
        self.save_record(object, &record)?;

        if self.config.log_transfers {
            info!(%object, %from, %to, "transferred object");
        }
        Ok(())
    }

    /// Walk owner pointers from `destination` up to `owner`, requiring each
    /// object on the way to exist and allow ungated transfer.
    fn verify_ungated_and_descendant(&self, owner: Address, destination: Address) -> Result<()> {
        let limit = self.config.max_nesting_depth;
        let record = self.record(destination)?;
        if !record.allow_ungated_transfer {
            return Err(ObjectError::NoUngatedTransfers(destination));
        }

        let mut current = record.owner;
        let mut hops = 0u32;
        while current != owner {
            hops += 1;
            if hops > limit {
                return Err(ObjectError::MaximumNesting {
                    object: destination,
                    limit,
                });
            }
            let record = self.record(current)?;
            if !record.allow_ungated_transfer {
                return Err(ObjectError::NoUngatedTransfers(current));
            }
            current = record.owner;
        }
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Remove the object's record and retire its transfer-event stream.
    /// Other resources at the address are left for their modules to remove.
    /// The GUID counter moves to the retired address.
    pub fn delete(&mut self, delete_ref: DeleteRef) -> Result<()> {
        let object = delete_ref.object_address();
        let record = self.record(object)?;
        self.erase(object, ObjectRecord::TYPE_TAG);
        self.save(
            create_retired_object_address(&object),
            RetiredObject::TYPE_TAG,
            &RetiredObject {
                guid_creation_num: record.guid_creation_num,
            },
        )?;
        self.destroy_handle(record.transfer_events);

        info!(%object, "deleted object");
        Ok(())
    }

    // =========================================================================
    // Resources
    // =========================================================================

    fn user_tag<T: Resource>() -> Result<&'static str> {
        if T::TYPE_TAG.starts_with(FRAMEWORK_NAMESPACE) {
            return Err(ObjectError::FrameworkResource(T::TYPE_TAG.to_string()));
        }
        Ok(T::TYPE_TAG)
    }

    fn resource_not_found<T: Resource>(address: Address) -> ObjectError {
        ObjectError::ResourceNotFound {
            address,
            type_tag: T::TYPE_TAG.to_string(),
        }
    }

    pub fn exists<T: Resource>(&self, address: Address) -> bool {
        self.has_raw(&StateKey::new(address, T::TYPE_TAG))
    }

    /// Copy of the `T` stored at `address`
    pub fn borrow<T: Resource>(&self, address: Address) -> Result<T> {
        self.load(address, T::TYPE_TAG)?
            .ok_or_else(|| Self::resource_not_found::<T>(address))
    }

    /// Publish `resource` at the signer's address
    pub fn move_to<T: Resource>(&mut self, signer: &Signer, resource: T) -> Result<()> {
        let type_tag = Self::user_tag::<T>()?;
        let address = signer.address();
        if self.exists::<T>(address) {
            return Err(ObjectError::ResourceExists {
                address,
                type_tag: type_tag.to_string(),
            });
        }
        self.save(address, type_tag, &resource)
    }

    /// Update the `T` at `address` in place. Other resources in the same
    /// group are untouched.
    pub fn modify<T: Resource, R>(
        &mut self,
        address: Address,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let type_tag = Self::user_tag::<T>()?;
        let mut value = self.borrow::<T>(address)?;
        let result = f(&mut value);
        self.save(address, type_tag, &value)?;
        Ok(result)
    }

    /// Remove and return the `T` at `address`
    pub fn move_from<T: Resource>(&mut self, address: Address) -> Result<T> {
        let type_tag = Self::user_tag::<T>()?;
        let value = self.borrow::<T>(address)?;
        self.erase(address, type_tag);
        Ok(value)
    }

    /// Attach a type witness: checks once that a `T` lives at the object
    pub fn convert<T: Resource>(&self, owner_ref: OwnerRef) -> Result<TypedOwnerRef<T>> {
        let object = owner_ref.object_address();
        if !self.exists::<T>(object) {
            return Err(Self::resource_not_found::<T>(object));
        }
        Ok(TypedOwnerRef::new(owner_ref))
    }
}
