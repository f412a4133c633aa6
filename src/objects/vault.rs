//! Ref vaults
//!
//! Refs can't be serialized, so a ref that must outlive its transaction is
//! parked in the holder's vault. The vault only records which `(kind,
//! object)` slots are filled; taking a slot back hands out a freshly
//! rebuilt ref, and only to the holder's signer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ObjectError, Result};
use super::refs::{sealed, Capability, RefKind, Signer, StorableRef};
use super::session::Session;
use crate::core::Address;

/// Durable refs held by one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefVault {
    slots: BTreeSet<(RefKind, Address)>,
}

impl RefVault {
    pub(crate) const TYPE_TAG: &'static str = "celereum::framework::vault::RefVault";

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn holds(&self, kind: RefKind, object: Address) -> bool {
        self.slots.contains(&(kind, object))
    }

    /// Filled slots, ordered by kind then object
    pub fn slots(&self) -> impl Iterator<Item = (RefKind, Address)> + '_ {
        self.slots.iter().copied()
    }
}

impl Session<'_> {
    fn load_vault(&self, holder: Address) -> Result<RefVault> {
        Ok(self.load(holder, RefVault::TYPE_TAG)?.unwrap_or_default())
    }

    fn save_vault(&mut self, holder: Address, vault: &RefVault) -> Result<()> {
        if vault.is_empty() {
            self.erase(holder, RefVault::TYPE_TAG);
            Ok(())
        } else {
            self.save(holder, RefVault::TYPE_TAG, vault)
        }
    }

    /// Park `stored` in the signer's vault
    pub fn store_ref<R: StorableRef>(&mut self, holder: &Signer, stored: R) -> Result<()> {
        let address = holder.address();
        let object = stored.object_address();
        let mut vault = self.load_vault(address)?;
        if !vault.slots.insert((R::KIND, object)) {
            return Err(ObjectError::RefAlreadyStored {
                holder: address,
                object,
                kind: R::KIND,
            });
        }
        self.save_vault(address, &vault)?;

        debug!(holder = %address, %object, kind = ?R::KIND, "stored ref");
        Ok(())
    }

    /// Take the `R` for `object` back out of the signer's vault
    pub fn take_ref<R: StorableRef>(&mut self, holder: &Signer, object: Address) -> Result<R> {
        let address = holder.address();
        let mut vault = self.load_vault(address)?;
        if !vault.slots.remove(&(R::KIND, object)) {
            return Err(ObjectError::RefNotStored {
                holder: address,
                object,
                kind: R::KIND,
            });
        }
        self.save_vault(address, &vault)?;

        debug!(holder = %address, %object, kind = ?R::KIND, "took ref");
        Ok(R::restore(object, sealed::Token))
    }

    /// Whether `holder`'s vault has an `R` for `object`
    pub fn holds_ref<R: StorableRef>(&self, holder: Address, object: Address) -> Result<bool> {
        Ok(self.load_vault(holder)?.holds(R::KIND, object))
    }

    /// Snapshot of `holder`'s vault. Empty when nothing is stored.
    pub fn ref_vault(&self, holder: Address) -> Result<RefVault> {
        self.load_vault(holder)
    }
}
