//! # vaultfs Store
//!
//! Storage layer for the vaultfs encrypted file store.
//!
//! This crate provides:
//! - **Storage trait**: files and directories addressed by `/`-separated
//!   paths relative to a storage root
//! - **LocalStorage**: a directory on the local filesystem, atomic writes
//! - **MemoryStorage**: an in-memory tree for tests and development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               vaultfs-core              │
//! ├─────────────────────────────────────────┤
//! │              Storage Trait              │
//! ├────────────────────┬────────────────────┤
//! │    LocalStorage    │   MemoryStorage    │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultfs_store::{LocalStorage, Storage};
//!
//! let store = LocalStorage::open("./data")?;
//! store.create_dir_all("ns/files")?;
//! store.write("ns/files/blob", b"bytes")?;
//! ```

pub mod error;
pub mod local;
pub mod memory;

pub use error::{Result, StoreError};
pub use local::LocalStorage;
pub use memory::MemoryStorage;

use bytes::Bytes;

/// Path separator used by every storage path
pub const SEPARATOR: char = '/';

/// One child of a listed directory
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    /// Final path component
    pub name: String,
    /// Whether the child is a directory
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Trait for storage backends
///
/// Paths are relative to the backend's root; `""` is the root itself, which
/// always exists. Implementations must be safe to share across threads.
pub trait Storage: Send + Sync {
    /// Read a whole file
    fn read(&self, path: &str) -> Result<Bytes>;

    /// Create or replace a file. The parent directory must exist.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Check if anything exists at `path`
    fn exists(&self, path: &str) -> Result<bool>;

    /// Check if `path` is an existing directory
    fn is_dir(&self, path: &str) -> Result<bool>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &str) -> Result<()>;

    /// List the children of a directory, sorted by name
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Remove a file
    fn remove_file(&self, path: &str) -> Result<()>;

    /// Remove an empty directory; fails with `DirectoryNotEmpty` otherwise.
    /// Entries that [`Storage::list_dir`] hides do not count and go with it.
    fn remove_dir(&self, path: &str) -> Result<()>;

    /// Remove a directory and everything below it
    fn remove_dir_all(&self, path: &str) -> Result<()>;
}

/// Check that a relative storage path stays inside the root.
pub fn validate_path(path: &str) -> Result<()> {
    if path.starts_with(SEPARATOR) || path.ends_with(SEPARATOR) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    if path.is_empty() {
        return Ok(());
    }
    let bad = path
        .split(SEPARATOR)
        .any(|part| part.is_empty() || part == "." || part == ".." || part.contains('\\'));
    if bad {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Join a parent path and a child name
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}

/// Parent of a path (`""` for top-level entries), `None` for the root
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once(SEPARATOR).map_or("", |(p, _)| p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("").is_ok());
        assert!(validate_path("a/b/c").is_ok());
        assert!(validate_path("/a").is_err());
        assert!(validate_path("a/").is_err());
        assert!(validate_path("a//b").is_err());
        assert!(validate_path("a/../b").is_err());
        assert!(validate_path("./a").is_err());
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a/b", "c"), "a/b/c");
        assert_eq!(parent("a/b/c"), Some("a/b"));
        assert_eq!(parent("a"), Some(""));
        assert_eq!(parent(""), None);
    }
}
