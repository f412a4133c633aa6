//! Object runtime errors
//!
//! Every error aborts the enclosing transaction. Callers distinguish
//! failures by [`ErrorKind`] or by the numeric abort code, which packs a
//! canonical category in the high bits and a reason in the low 16 bits.

use super::refs::RefKind;
use crate::core::Address;

/// Result type for object operations
pub type Result<T> = std::result::Result<T, ObjectError>;

// Canonical abort categories
pub const PERMISSION_DENIED: u64 = 0x5;
pub const NOT_FOUND: u64 = 0x6;
pub const ALREADY_EXISTS: u64 = 0x8;
pub const RESOURCE_EXHAUSTED: u64 = 0x9;
pub const INTERNAL: u64 = 0xB;

// Reasons
pub const EOBJECT_EXISTS: u64 = 1;
pub const EOBJECT_DOES_NOT_EXIST: u64 = 2;
pub const ENO_UNGATED_TRANSFERS: u64 = 3;
pub const ENOT_OBJECT_OWNER: u64 = 4;
pub const ECANNOT_DELETE: u64 = 5;
pub const EMAXIMUM_NESTING: u64 = 6;
pub const ERESOURCE_EXISTS: u64 = 7;
pub const ERESOURCE_DOES_NOT_EXIST: u64 = 8;
pub const ESTORE_EXISTS: u64 = 9;
pub const ESTORE_DOES_NOT_EXIST: u64 = 10;
pub const EALREADY_PRESENT: u64 = 11;
pub const ENOT_IN_STORE: u64 = 12;
pub const ECODEC: u64 = 13;
pub const EFRAMEWORK_RESOURCE: u64 = 14;
pub const EREF_ALREADY_STORED: u64 = 15;
pub const EREF_NOT_STORED: u64 = 16;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    AlreadyPresent,
    ResourceExhausted,
    Internal,
}

/// Object runtime errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    #[error("object: an object already exists at {0}")]
    ObjectExists(Address),

    #[error("object: no object exists at {0}")]
    ObjectDoesNotExist(Address),

    #[error("object: ungated transfers are disabled for {0}")]
    NoUngatedTransfers(Address),

    #[error("object: {caller} is not the owner of {object}")]
    NotObjectOwner { object: Address, caller: Address },

    #[error("object: creator ref for {0} was not granted delete permission")]
    CannotDelete(Address),

    #[error("object: owner chain of {object} exceeds {limit} hops")]
    MaximumNesting { object: Address, limit: u32 },

    #[error("resource: {type_tag} already exists at {address}")]
    ResourceExists { address: Address, type_tag: String },

    #[error("resource: {type_tag} does not exist at {address}")]
    ResourceNotFound { address: Address, type_tag: String },

    #[error("resource: {0} is reserved for the object framework")]
    FrameworkResource(String),

    #[error("ownership_store: store already initialized for {0}")]
    StoreExists(Address),

    #[error("ownership_store: no store initialized for {0}")]
    StoreDoesNotExist(Address),

    #[error("ownership_store: {object} is already held by the store of {owner}")]
    AlreadyPresent { owner: Address, object: Address },

    #[error("ownership_store: {object} is not held by the store of {owner}")]
    NotInStore { owner: Address, object: Address },

    #[error("ref_vault: {kind:?} ref for {object} is already stored by {holder}")]
    RefAlreadyStored {
        holder: Address,
        object: Address,
        kind: RefKind,
    },

    #[error("ref_vault: no {kind:?} ref for {object} is stored by {holder}")]
    RefNotStored {
        holder: Address,
        object: Address,
        kind: RefKind,
    },

    #[error("codec: {0}")]
    Codec(String),
}

impl ObjectError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ObjectExists(_) | Self::ResourceExists { .. } | Self::StoreExists(_) => {
                ErrorKind::AlreadyExists
            }
            Self::ObjectDoesNotExist(_)
            | Self::ResourceNotFound { .. }
            | Self::StoreDoesNotExist(_)
            | Self::NotInStore { .. }
            | Self::RefNotStored { .. } => ErrorKind::NotFound,
            Self::NoUngatedTransfers(_)
            | Self::NotObjectOwner { .. }
            | Self::CannotDelete(_)
            | Self::FrameworkResource(_) => ErrorKind::PermissionDenied,
            Self::AlreadyPresent { .. } | Self::RefAlreadyStored { .. } => {
                ErrorKind::AlreadyPresent
            }
            Self::MaximumNesting { .. } => ErrorKind::ResourceExhausted,
            Self::Codec(_) => ErrorKind::Internal,
        }
    }

    /// Module-specific reason code
    pub fn reason(&self) -> u64 {
        match self {
            Self::ObjectExists(_) => EOBJECT_EXISTS,
            Self::ObjectDoesNotExist(_) => EOBJECT_DOES_NOT_EXIST,
            Self::NoUngatedTransfers(_) => ENO_UNGATED_TRANSFERS,
            Self::NotObjectOwner { .. } => ENOT_OBJECT_OWNER,
            Self::CannotDelete(_) => ECANNOT_DELETE,
            Self::MaximumNesting { .. } => EMAXIMUM_NESTING,
            Self::ResourceExists { .. } => ERESOURCE_EXISTS,
            Self::ResourceNotFound { .. } => ERESOURCE_DOES_NOT_EXIST,
            Self::FrameworkResource(_) => EFRAMEWORK_RESOURCE,
            Self::StoreExists(_) => ESTORE_EXISTS,
            Self::StoreDoesNotExist(_) => ESTORE_DOES_NOT_EXIST,
            Self::AlreadyPresent { .. } => EALREADY_PRESENT,
            Self::NotInStore { .. } => ENOT_IN_STORE,
            Self::RefAlreadyStored { .. } => EREF_ALREADY_STORED,
            Self::RefNotStored { .. } => EREF_NOT_STORED,
            Self::Codec(_) => ECODEC,
        }
    }

    /// Abort code reported to the transaction layer
    pub fn abort_code(&self) -> u64 {
        let category = match self.kind() {
            ErrorKind::AlreadyExists | ErrorKind::AlreadyPresent => ALREADY_EXISTS,
            ErrorKind::NotFound => NOT_FOUND,
            ErrorKind::PermissionDenied => PERMISSION_DENIED,
            ErrorKind::ResourceExhausted => RESOURCE_EXHAUSTED,
            ErrorKind::Internal => INTERNAL,
        };
        (category << 16) | self.reason()
    }

    /// Module that raised the error
    pub fn module(&self) -> &'static str {
        match self {
            Self::ResourceExists { .. }
            | Self::ResourceNotFound { .. }
            | Self::FrameworkResource(_) => "resource",
            Self::StoreExists(_)
            | Self::StoreDoesNotExist(_)
            | Self::AlreadyPresent { .. }
            | Self::NotInStore { .. } => "ownership_store",
            Self::RefAlreadyStored { .. } | Self::RefNotStored { .. } => "ref_vault",
            Self::Codec(_) => "codec",
            _ => "object",
        }
    }
}

impl From<bincode::Error> for ObjectError {
    fn from(err: bincode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
