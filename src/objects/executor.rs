//! Object Transaction Executor
//!
//! Runs transactions against shared state. Each transaction gets a fresh
//! [`Session`]; its buffered writes and events are applied together when it
//! returns `Ok` and dropped when it aborts.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use super::error::Result;
use super::event::{EventLog, MemoryEventLog};
use super::session::Session;
use crate::core::{AccountProvider, ConfigError, NativeAccounts, RuntimeConfig};
use crate::storage::{MemoryStateStore, StateStore};

/// Object transaction executor
pub struct ObjectExecutor<S: StateStore, L: EventLog> {
    /// Committed state
    state: RwLock<S>,
    /// Committed events
    events: RwLock<L>,
    /// Signer derivation
    accounts: Arc<dyn AccountProvider>,
    config: RuntimeConfig,
}

impl<S: StateStore, L: EventLog> ObjectExecutor<S, L> {
    /// Create a new executor using native account signers
    pub fn new(
        state: S,
        events: L,
        config: RuntimeConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_accounts(state, events, config, Arc::new(NativeAccounts))
    }

    pub fn with_accounts(
        state: S,
        events: L,
        config: RuntimeConfig,
        accounts: Arc<dyn AccountProvider>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(state),
            events: RwLock::new(events),
            accounts,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Execute one transaction atomically.
    ///
    /// Transactions are serialized on the state write lock.
    pub fn execute<R>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<R>) -> Result<R> {
        let mut state = self.state.write();
        let mut session = Session::new(&*state, &*self.accounts, &self.config);

        match f(&mut session) {
            Ok(value) => {
                let (changes, emitted) = session.into_effects();
                debug!(
                    writes = changes.len(),
                    events = emitted.len(),
                    "committing transaction"
                );
                state.apply(changes);
                self.events.write().append(emitted);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    code = err.abort_code(),
                    module = err.module(),
                    error = %err,
                    "transaction aborted"
                );
                Err(err)
            }
        }
    }

    /// Run a read-only query against committed state. Writes made by `f`
    /// are discarded.
    pub fn view<R>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<R>) -> Result<R> {
        let state = self.state.read();
        let mut session = Session::new(&*state, &*self.accounts, &self.config);
        f(&mut session)
    }

    /// Committed state
    pub fn state(&self) -> RwLockReadGuard<'_, S> {
        self.state.read()
    }

    /// Committed event log
    pub fn events(&self) -> RwLockReadGuard<'_, L> {
        self.events.read()
    }
}

/// Executor over in-memory state and event log
pub type MemoryExecutor = ObjectExecutor<MemoryStateStore, MemoryEventLog>;

impl MemoryExecutor {
    pub fn in_memory(config: RuntimeConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(MemoryStateStore::new(), MemoryEventLog::new(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;
    use crate::objects::error::{ErrorKind, ObjectError};
    use crate::objects::object::{ObjectRecord, Resource, TransferEvent};
    use crate::objects::derive::create_object_address;
    use crate::objects::refs::{Capability, DeleteRef, Signer};
    use crate::storage::StateKey;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sword {
        damage: u32,
    }

    impl Resource for Sword {
        const TYPE_TAG: &'static str = "example::items::Sword";
    }

    fn create_test_executor() -> MemoryExecutor {
        MemoryExecutor::in_memory(RuntimeConfig::default()).unwrap()
    }

    fn alice() -> Signer {
        Signer::privileged(Address::from_u64(0xa11ce))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = RuntimeConfig::default().with_max_nesting_depth(0);
        assert!(matches!(
            MemoryExecutor::in_memory(config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_commit_persists_state() {
        let executor = create_test_executor();
        let object = executor
            .execute(|session| {
                let creator = session.create_named_object(&alice(), b"vault")?;
                Ok(creator.object_address())
            })
            .unwrap();

        assert!(executor
            .state()
            .contains(&StateKey::new(object, ObjectRecord::TYPE_TAG)));
        let owner = executor.view(|session| session.owner(object)).unwrap();
        assert_eq!(owner, alice().address());
    }

    #[test]
    fn test_abort_rolls_back() {
        let executor = create_test_executor();
        let before = executor.state().digest();

        let err = executor
            .execute(|session| {
                session.create_named_object(&alice(), b"doomed")?;
                // Second creation at the same address aborts the whole
                // transaction, including the first write.
                session.create_named_object(&alice(), b"doomed")?;
                Ok(())
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(executor.state().digest(), before);
        assert!(executor.events().is_empty());
    }

    #[test]
    fn test_transfer_events_committed() {
        let executor = create_test_executor();
        let bob = Address::from_u64(0xb0b);

        let object = executor
            .execute(|session| {
                let creator = session.create_object_from_account(&alice())?;
                let object = creator.object_address();
                session.transfer(&alice(), object, bob)?;
                Ok(object)
            })
            .unwrap();

        let guid = executor
            .view(|session| Ok(session.record(object)?.transfer_events().guid()))
            .unwrap();
        let events = executor.events().decoded::<TransferEvent>(&guid);
        assert_eq!(
            events,
            vec![TransferEvent {
                object,
                from: alice().address(),
                to: bob,
            }]
        );
    }

    #[test]
    fn test_failed_transfer_emits_nothing() {
        let executor = create_test_executor();
        let stranger = Signer::privileged(Address::from_u64(0x5757));

        let object = executor
            .execute(|session| Ok(session.create_object_from_account(&alice())?.object_address()))
            .unwrap();
        let committed = executor.events().len();

        let err = executor
            .execute(|session| session.transfer(&stranger, object, stranger.address()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(executor.events().len(), committed);
    }

    #[test]
    fn test_group_dropped_after_delete() {
        let executor = create_test_executor();

        let object = executor
            .execute(|session| {
                let creator = session.create_object_from_account(&alice())?;
                let signer = session.generate_signer(&creator);
                session.move_to(&signer, Sword { damage: 7 })?;
                let object = creator.object_address();

                session.delete(creator.generate_delete_ref()?)?;
                Ok(object)
            })
            .unwrap();

        // The sword outlives the record.
        assert_eq!(executor.state().group(&object).map(|g| g.len()), Some(1));
        assert!(!executor.view(|session| Ok(session.exists_at(object))).unwrap());

        executor
            .execute(|session| session.move_from::<Sword>(object).map(|_| ()))
            .unwrap();
        assert!(executor.state().group(&object).is_none());
    }

    #[test]
    fn test_deletable_named_object_leaves_no_group() {
        let executor = create_test_executor();

        let object = executor
            .execute(|session| {
                let creator = session.create_object(&alice(), b"jade", true)?;
                let signer = session.generate_signer(&creator);
                session.move_to(&signer, Sword { damage: 3 })?;
                session.store_ref(&alice(), creator.generate_delete_ref()?)?;
                Ok(creator.object_address())
            })
            .unwrap();
        assert_eq!(object, create_object_address(&alice().address(), b"jade"));

        executor
            .execute(|session| {
                let delete_ref = session.take_ref::<DeleteRef>(&alice(), object)?;
                session.delete(delete_ref)?;
                session.move_from::<Sword>(object).map(|_| ())
            })
            .unwrap();

        assert!(executor.state().group(&object).is_none());
        assert!(!executor.view(|session| Ok(session.exists_at(object))).unwrap());
    }

    #[test]
    fn test_view_discards_writes() {
        let executor = create_test_executor();
        let before = executor.state().digest();

        executor
            .view(|session| session.create_named_object(&alice(), b"scratch").map(|_| ()))
            .unwrap();
        assert_eq!(executor.state().digest(), before);
    }

    #[test]
    fn test_deleted_object_is_gone_for_later_transactions() {
        let executor = create_test_executor();

        let object = executor
            .execute(|session| {
                let creator = session.create_object_from_account(&alice())?;
                let object = creator.object_address();
                session.delete(creator.generate_delete_ref()?)?;
                Ok(object)
            })
            .unwrap();

        let err = executor
            .execute(|session| session.transfer(&alice(), object, Address::from_u64(2)))
            .unwrap_err();
        assert_eq!(err, ObjectError::ObjectDoesNotExist(object));
    }
}
