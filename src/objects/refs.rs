//! Capability refs
//!
//! Authority over an object is carried by bearer tokens rather than an
//! access list. None of these types are `Clone`: holding the value is
//! holding the privilege, and handing it over moves it.
//!
//! - [`CreatorRef`]: returned once at creation; every other ref is derived from it
//! - [`DeleteRef`]: removes the object (only if the creator allowed deletion)
//! - [`ExtendRef`]: re-derives the object's [`Signer`] to publish more resources
//! - [`TransferRef`]: disables ungated transfer and mints [`LinearTransferRef`]s
//! - [`LinearTransferRef`]: one transfer, bypassing the ungated-transfer gate
//! - [`OwnerRef`] / [`TypedOwnerRef`]: proof of holding an object, kept in ownership stores
//!
//! None of them implement `Deserialize` either, so a ref can't be rebuilt
//! from bytes. Durable refs are parked in framework containers (a
//! [`RefVault`](super::vault::RefVault) or an ownership store) and handed
//! back by the session.

use super::error::{ObjectError, Result};
use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Execution capability for one address.
///
/// Anything published "as" an address needs its signer. Signers for
/// objects only come out of the object runtime; signers for accounts are
/// produced by the host after authentication.
#[derive(PartialEq, Eq)]
pub struct Signer {
    address: Address,
}

impl Signer {
    /// Native, privileged constructor. Only the host's account layer and
    /// the object runtime should call this.
    pub fn privileged(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({})", self.address)
    }
}

/// Anything scoped to exactly one object
pub trait Capability {
    /// Address of the object this capability is bound to
    fn object_address(&self) -> Address;
}

macro_rules! impl_capability {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Capability for $ty {
                fn object_address(&self) -> Address {
                    self.object
                }
            }
        )*
    };
}

/// Returned by object creation. Not storable.
#[derive(Debug, PartialEq, Eq)]
pub struct CreatorRef {
    object: Address,
    can_delete: bool,
}

/// Permission to delete the object
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRef {
    object: Address,
}

/// Permission to re-derive the object's signer
#[derive(Debug, PartialEq, Eq)]
pub struct ExtendRef {
    object: Address,
}

/// Permission to manage transfers of the object
#[derive(Debug, PartialEq, Eq)]
pub struct TransferRef {
    object: Address,
}

/// Single-use transfer authorization.
///
/// Records the owner at minting time; it stops working once the object
/// changes hands.
#[derive(Debug, PartialEq, Eq)]
pub struct LinearTransferRef {
    object: Address,
    owner: Address,
}

/// Untyped proof of holding an object
#[derive(Debug, PartialEq, Eq)]
pub struct OwnerRef {
    object: Address,
}

impl_capability!(CreatorRef, DeleteRef, ExtendRef, TransferRef, LinearTransferRef, OwnerRef);

/// Kind of a durable ref, as recorded by framework containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefKind {
    Delete,
    Extend,
    Transfer,
    Owner,
}

pub(crate) mod sealed {
    use crate::core::Address;

    /// Only the framework can name this, so only the framework can call
    /// [`Sealed::restore`].
    pub struct Token;

    pub trait Sealed: Sized {
        fn restore(object: Address, token: Token) -> Self;
    }
}

/// Durable ref that framework containers may hold on a caller's behalf
pub trait StorableRef: Capability + sealed::Sealed {
    const KIND: RefKind;
}

macro_rules! impl_storable_ref {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {
                fn restore(object: Address, _token: sealed::Token) -> Self {
                    $ty { object }
                }
            }

            impl StorableRef for $ty {
                const KIND: RefKind = RefKind::$kind;
            }
        )*
    };
}

impl_storable_ref!(
    DeleteRef => Delete,
    ExtendRef => Extend,
    TransferRef => Transfer,
    OwnerRef => Owner,
);

impl CreatorRef {
    pub(crate) fn new(object: Address, can_delete: bool) -> Self {
        Self { object, can_delete }
    }

    pub fn can_delete(&self) -> bool {
        self.can_delete
    }

    /// Mint a [`DeleteRef`]. Fails for objects created undeletable.
    pub fn generate_delete_ref(&self) -> Result<DeleteRef> {
        if !self.can_delete {
            return Err(ObjectError::CannotDelete(self.object));
        }
        Ok(DeleteRef {
            object: self.object,
        })
    }

    pub fn generate_extend_ref(&self) -> ExtendRef {
        ExtendRef {
            object: self.object,
        }
    }

    pub fn generate_transfer_ref(&self) -> TransferRef {
        TransferRef {
            object: self.object,
        }
    }

    pub fn generate_owner_ref(&self) -> OwnerRef {
        OwnerRef {
            object: self.object,
        }
    }
}

impl TransferRef {
    pub(crate) fn linear(&self, owner: Address) -> LinearTransferRef {
        LinearTransferRef {
            object: self.object,
            owner,
        }
    }
}

impl LinearTransferRef {
    /// Owner the transfer was authorized against
    pub fn owner(&self) -> Address {
        self.owner
    }
}

/// An [`OwnerRef`] whose object was checked to hold a `T` when it was typed.
///
/// The check happens once in `Session::convert`; the witness itself carries
/// no runtime state.
pub struct TypedOwnerRef<T> {
    inner: OwnerRef,
    _resource: PhantomData<fn() -> T>,
}

impl<T> TypedOwnerRef<T> {
    pub(crate) fn new(inner: OwnerRef) -> Self {
        Self {
            inner,
            _resource: PhantomData,
        }
    }

    /// Drop the type witness
    pub fn into_untyped(self) -> OwnerRef {
        self.inner
    }
}

impl<T> Capability for TypedOwnerRef<T> {
    fn object_address(&self) -> Address {
        self.inner.object
    }
}

impl<T> fmt::Debug for TypedOwnerRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypedOwnerRef<{}>({})",
            std::any::type_name::<T>(),
            self.inner.object
        )
    }
}
