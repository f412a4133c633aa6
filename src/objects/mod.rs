//! Object Model
//!
//! Objects are resource groups published at deterministically derived
//! addresses. Each carries an [`ObjectRecord`] naming its owner, which may
//! itself be an object, so ownership forms a forest.
//!
//! # Key Concepts
//! - **Address derivation**: SHA3-256 over the creator, a seed and a scheme byte
//! - **Capabilities**: non-copyable refs minted once at creation and used
//!   later to sign, delete, gate or transfer the object
//! - **Ungated transfer**: the owner, or any ancestor owner, may move an object
//!   as long as every object on the path allows it
//! - **Session**: buffered per-transaction view; the executor commits it or
//!   drops it whole
//! - **Ref vaults**: refs never serialize; ones that must outlive a
//!   transaction are parked with their holder and rebuilt on the way out

pub mod derive;
pub mod error;
pub mod event;
pub mod executor;
pub mod guid;
pub mod object;
pub mod ownership;
pub mod refs;
pub mod session;
pub mod vault;

pub use derive::{
    create_object_address, create_object_address_from_guid, create_resource_address,
    create_retired_object_address, OBJECT_FROM_GUID_ADDRESS_SCHEME,
    OBJECT_FROM_SEED_ADDRESS_SCHEME, RESOURCE_ADDRESS_SCHEME, RETIRED_OBJECT_ADDRESS_SCHEME,
};
pub use error::{ErrorKind, ObjectError, Result};
pub use event::{EmittedEvent, Event, EventHandle, EventLog, MemoryEventLog};
pub use executor::{MemoryExecutor, ObjectExecutor};
pub use guid::{Guid, GuidId};
pub use object::{ObjectRecord, Resource, TransferEvent, FRAMEWORK_NAMESPACE};
pub use ownership::{DepositEvent, OwnershipStore, WithdrawEvent};
pub use refs::{
    Capability, CreatorRef, DeleteRef, ExtendRef, LinearTransferRef, OwnerRef, RefKind, Signer,
    StorableRef, TransferRef, TypedOwnerRef,
};
pub use session::Session;
pub use vault::RefVault;
