//! Core ledger types shared by the object runtime
//!
//! - [`Address`]: the 32-byte address space accounts and objects share
//! - [`AccountProvider`]: the host's signer source
//! - [`RuntimeConfig`]: runtime limits and logging switches

pub mod account;
pub mod address;
pub mod config;

pub use account::{Account, AccountProvider, NativeAccounts};
pub use address::{Address, AddressParseError, ObjectId, ADDRESS_LENGTH};
pub use config::{ConfigError, RuntimeConfig, DEFAULT_MAX_NESTING_DEPTH};
