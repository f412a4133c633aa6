//! Ownership stores
//!
//! An account that holds many objects can keep their [`OwnerRef`]s in one
//! keyed store published at its own address. A given object's ref sits in
//! at most one slot: withdrawing moves it out.
//!
//! The store records which objects it holds, not the refs themselves. A ref
//! is rebuilt only when its slot is withdrawn.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ObjectError, Result};
use super::event::{Event, EventHandle};
use super::object::Resource;
use super::refs::{sealed, Capability, OwnerRef, Signer, TypedOwnerRef};
use super::session::Session;
use crate::core::Address;

/// Keyed collection of owner refs, stored at the owner's address
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnershipStore {
    objects: BTreeSet<Address>,
    deposit_events: EventHandle<DepositEvent>,
    withdraw_events: EventHandle<WithdrawEvent>,
}

impl OwnershipStore {
    pub(crate) const TYPE_TAG: &'static str = "celereum::framework::ownership::OwnershipStore";

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object addresses currently held
    pub fn objects(&self) -> impl Iterator<Item = &Address> {
        self.objects.iter()
    }

    pub fn deposit_events(&self) -> &EventHandle<DepositEvent> {
        &self.deposit_events
    }

    pub fn withdraw_events(&self) -> &EventHandle<WithdrawEvent> {
        &self.withdraw_events
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub object: Address,
}

impl Event for DepositEvent {
    const TYPE_TAG: &'static str = "celereum::framework::ownership::DepositEvent";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawEvent {
    pub object: Address,
}

impl Event for WithdrawEvent {
    const TYPE_TAG: &'static str = "celereum::framework::ownership::WithdrawEvent";
}

impl Session<'_> {
    fn load_store(&self, owner: Address) -> Result<OwnershipStore> {
        self.load(owner, OwnershipStore::TYPE_TAG)?
            .ok_or(ObjectError::StoreDoesNotExist(owner))
    }

    fn save_store(&mut self, owner: Address, store: &OwnershipStore) -> Result<()> {
        self.save(owner, OwnershipStore::TYPE_TAG, store)
    }

    /// One-time setup of the signer's store
    pub fn init_store(&mut self, owner: &Signer) -> Result<()> {
        let address = owner.address();
        if self.has(address, OwnershipStore::TYPE_TAG) {
            return Err(ObjectError::StoreExists(address));
        }

        let store = OwnershipStore {
            objects: BTreeSet::new(),
            deposit_events: self.new_event_handle(owner)?,
            withdraw_events: self.new_event_handle(owner)?,
        };
        self.save_store(address, &store)?;

        debug!(%address, "initialized ownership store");
        Ok(())
    }

    /// Place `owner_ref` in `owner`'s store
    pub fn deposit(&mut self, owner: Address, owner_ref: OwnerRef) -> Result<()> {
        let mut store = self.load_store(owner)?;
        let object = owner_ref.object_address();
        if !store.objects.insert(object) {
            return Err(ObjectError::AlreadyPresent { owner, object });
        }
        self.emit(&mut store.deposit_events, DepositEvent { object })?;
        self.save_store(owner, &store)?;

        debug!(%owner, %object, "deposited owner ref");
        Ok(())
    }

    /// Take the ref for `object` out of the signer's store
    pub fn withdraw(&mut self, owner: &Signer, object: Address) -> Result<OwnerRef> {
        let address = owner.address();
        let mut store = self.load_store(address)?;
        if !store.objects.remove(&object) {
            return Err(ObjectError::NotInStore {
                owner: address,
                object,
            });
        }

        self.emit(&mut store.withdraw_events, WithdrawEvent { object })?;
        self.save_store(address, &store)?;

        debug!(owner = %address, %object, "withdrew owner ref");
        Ok(<OwnerRef as sealed::Sealed>::restore(object, sealed::Token))
    }

    /// Whether `owner`'s store holds `object`. False when there is no store;
    /// any other failure to read the store is returned.
    pub fn contains(&self, owner: Address, object: Address) -> Result<bool> {
        match self.load_store(owner) {
            Ok(store) => Ok(store.objects.contains(&object)),
            Err(ObjectError::StoreDoesNotExist(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of refs in `owner`'s store
    pub fn store_len(&self, owner: Address) -> Result<usize> {
        Ok(self.load_store(owner)?.len())
    }

    /// Snapshot of `owner`'s store
    pub fn ownership_store(&self, owner: Address) -> Result<OwnershipStore> {
        self.load_store(owner)
    }

    /// Deposit a typed ref; the witness is dropped
    pub fn deposit_typed<T>(&mut self, owner: Address, owner_ref: TypedOwnerRef<T>) -> Result<()> {
        self.deposit(owner, owner_ref.into_untyped())
    }

    /// Withdraw and re-attach the `T` witness
    pub fn withdraw_typed<T: Resource>(
        &mut self,
        owner: &Signer,
        object: Address,
    ) -> Result<TypedOwnerRef<T>> {
        let owner_ref = self.withdraw(owner, object)?;
        self.convert(owner_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NativeAccounts, RuntimeConfig};
    use crate::objects::error::ErrorKind;
    use crate::objects::refs::CreatorRef;
    use crate::storage::{ChangeSet, MemoryStateStore, StateKey, StateStore};

    #[derive(Debug, Serialize, Deserialize)]
    struct Hero {
        level: u8,
    }

    impl Resource for Hero {
        const TYPE_TAG: &'static str = "example::hero::Hero";
    }

    fn holder() -> Signer {
        Signer::privileged(Address::from_u64(0x401d))
    }

    fn with_session<R>(f: impl FnOnce(&mut Session<'_>) -> R) -> R {
        let store = MemoryStateStore::new();
        let config = RuntimeConfig::default();
        let mut session = Session::new(&store, &NativeAccounts, &config);
        f(&mut session)
    }

    fn new_object(session: &mut Session<'_>) -> CreatorRef {
        session.create_object_from_account(&holder()).unwrap()
    }

    #[test]
    fn test_init_is_one_time() {
        with_session(|session| {
            let owner = holder();
            session.init_store(&owner).unwrap();
            assert_eq!(session.store_len(owner.address()).unwrap(), 0);

            let err = session.init_store(&owner).unwrap_err();
            assert_eq!(err, ObjectError::StoreExists(owner.address()));
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        });
    }

    #[test]
    fn test_deposit_requires_store() {
        with_session(|session| {
            let object = new_object(session);
            let err = session
                .deposit(holder().address(), object.generate_owner_ref())
                .unwrap_err();
            assert_eq!(err, ObjectError::StoreDoesNotExist(holder().address()));
        });
    }

    #[test]
    fn test_store_exclusivity() {
        with_session(|session| {
            let owner = holder();
            session.init_store(&owner).unwrap();
            let object = new_object(session);
            let id = object.object_address();

            session
                .deposit(owner.address(), object.generate_owner_ref())
                .unwrap();
            assert!(session.contains(owner.address(), id).unwrap());

            let err = session
                .deposit(owner.address(), object.generate_owner_ref())
                .unwrap_err();
            assert_eq!(
                err,
                ObjectError::AlreadyPresent {
                    owner: owner.address(),
                    object: id
                }
            );
            assert_eq!(err.kind(), ErrorKind::AlreadyPresent);

            // After a withdraw the slot is free again.
            let owner_ref = session.withdraw(&owner, id).unwrap();
            assert!(!session.contains(owner.address(), id).unwrap());
            session.deposit(owner.address(), owner_ref).unwrap();
            assert_eq!(session.store_len(owner.address()).unwrap(), 1);
        });
    }

    #[test]
    fn test_withdraw_missing() {
        with_session(|session| {
            let owner = holder();
            session.init_store(&owner).unwrap();
            let id = Address::from_u64(0x99);

            let err = session.withdraw(&owner, id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert!(!session.contains(Address::from_u64(0x1234), id).unwrap());
        });
    }

    #[test]
    fn test_contains_reports_unreadable_store() {
        let mut store = MemoryStateStore::new();
        let mut changes = ChangeSet::new();
        changes.put(
            StateKey::new(holder().address(), OwnershipStore::TYPE_TAG),
            vec![0xff],
        );
        store.apply(changes);
        let config = RuntimeConfig::default();
        let session = Session::new(&store, &NativeAccounts, &config);

        let err = session
            .contains(holder().address(), Address::from_u64(0x99))
            .unwrap_err();
        assert!(matches!(err, ObjectError::Codec(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_moving_between_stores() {
        with_session(|session| {
            let first = holder();
            let second = Signer::privileged(Address::from_u64(0x5ec0));
            session.init_store(&first).unwrap();
            session.init_store(&second).unwrap();

            let object = new_object(session);
            let id = object.object_address();
            session
                .deposit(first.address(), object.generate_owner_ref())
                .unwrap();

            let owner_ref = session.withdraw(&first, id).unwrap();
            session.deposit(second.address(), owner_ref).unwrap();

            assert!(!session.contains(first.address(), id).unwrap());
            assert!(session.contains(second.address(), id).unwrap());
        });
    }

    #[test]
    fn test_events_recorded() {
        with_session(|session| {
            let owner = holder();
            session.init_store(&owner).unwrap();
            let object = new_object(session);
            let id = object.object_address();

            session
                .deposit(owner.address(), object.generate_owner_ref())
                .unwrap();
            session.withdraw(&owner, id).unwrap();

            let store = session.ownership_store(owner.address()).unwrap();
            assert_eq!(store.deposit_events().counter(), 1);
            assert_eq!(store.withdraw_events().counter(), 1);
            assert_ne!(store.deposit_events().guid(), store.withdraw_events().guid());

            let deposits: Vec<DepositEvent> = session
                .pending_events()
                .iter()
                .filter_map(|e| e.decode::<DepositEvent>())
                .collect();
            assert_eq!(deposits, vec![DepositEvent { object: id }]);
        });
    }

    #[test]
    fn test_typed_round_trip() {
        with_session(|session| {
            let owner = holder();
            session.init_store(&owner).unwrap();
            let object = new_object(session);
            let id = object.object_address();
            let object_signer = session.generate_signer(&object);
            session.move_to(&object_signer, Hero { level: 3 }).unwrap();

            let typed = session.convert::<Hero>(object.generate_owner_ref()).unwrap();
            session.deposit_typed(owner.address(), typed).unwrap();

            let typed = session.withdraw_typed::<Hero>(&owner, id).unwrap();
            assert_eq!(typed.object_address(), id);
            assert_eq!(session.borrow::<Hero>(id).unwrap().level, 3);
        });
    }
}
