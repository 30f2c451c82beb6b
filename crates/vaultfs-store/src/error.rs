//! Error types for the vaultfs-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Path not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Expected a directory
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory still has children
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Path escapes the storage root or is malformed
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Check whether this error means the path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
