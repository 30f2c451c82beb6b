//! # vaultfs Core
//!
//! Encrypted virtual filesystem and sharing engine.
//!
//! This crate provides:
//! - **Location Resolver**: virtual paths to encrypted storage paths and location hashes
//! - **Metadata Store**: per-namespace size, write time and download records
//! - **Tree Engine**: list, read, write and recursive delete
//! - **Share Registry**: re-encrypted public copies and redirects between them
//! - **User Lifecycle**: key-only accounts, temporary users and expiry sweeps
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                  Vault                  │
//! ├──────────────┬─────────────┬────────────┤
//! │  Tree Engine │   Shares    │   Users    │
//! ├──────────────┴─────────────┴────────────┤
//! │      Location Resolver │  Metadata      │
//! ├─────────────────────────────────────────┤
//! │     vaultfs-crypto   │  vaultfs-store   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultfs_core::{Vault, VaultConfig};
//!
//! let vault = Vault::open(VaultConfig::with_root("./data"))?;
//! let key = vault.create_user()?;
//! vault.write_file(&key, "docs/report.txt", b"hello")?;
//! let hash = vault.create_share(&key, "docs/report.txt")?;
//! let shared = vault.resolve_share(&hash)?;
//! ```

pub mod config;
pub mod error;
pub mod location;
pub mod metadata;
pub mod share;
pub mod tree;
pub mod user;
pub mod vault;

pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use location::sanitize_virtual_path;
pub use metadata::{FileInfo, FileInfoPatch, UserInfos};
pub use share::{ShareDescriptor, ShareEntry, ShareRegistry, SharedBlob};
pub use tree::TreeEntry;
pub use user::UserProfile;
pub use vault::Vault;
pub use vaultfs_crypto::KdfParams;
