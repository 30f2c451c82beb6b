//! # vaultfs
//!
//! Encrypted virtual filesystem with shareable links.
//!
//! This package re-exports the workspace crates:
//! - [`crypto`]: key derivation, name and blob encryption
//! - [`store`]: storage backends
//! - the engine itself ([`Vault`] and friends) at the top level

pub use vaultfs_core::*;
pub use vaultfs_crypto as crypto;
pub use vaultfs_store as store;
