//! Account collaborators
//!
//! Authentication and the account model belong to the host ledger. The
//! object runtime only needs two things from it: a signer for an address
//! it is entitled to act as, and a per-account GUID counter.

use serde::{Deserialize, Serialize};

use super::Address;
use crate::objects::Signer;

/// Execution-capability provider
pub trait AccountProvider: Send + Sync {
    /// Produce the signer for `address`. Called only for addresses the
    /// runtime has just created or already holds a capability for.
    fn create_signer(&self, address: Address) -> Signer;
}

/// Default provider: mints signers directly
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeAccounts;

impl AccountProvider for NativeAccounts {
    fn create_signer(&self, address: Address) -> Signer {
        Signer::privileged(address)
    }
}

/// GUID counter kept at a plain account's address.
/// Created on first use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub guid_creation_num: u64,
}

impl Account {
    pub(crate) const TYPE_TAG: &'static str = "celereum::framework::account::Account";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_signer() {
        let addr = Address::from_u64(0xcafe);
        assert_eq!(NativeAccounts.create_signer(addr).address(), addr);
    }

    #[test]
    fn test_account_starts_at_zero() {
        assert_eq!(Account::default().guid_creation_num, 0);
    }
}
