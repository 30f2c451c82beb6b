//! Error types for the vaultfs-core crate

use thiserror::Error;
use vaultfs_crypto::CryptoError;
use vaultfs_store::StoreError;

/// Result type alias using `VaultError`
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors that can occur in vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// File, folder or share not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored data did not decrypt under the presented key
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// The target is already in the requested state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed path, token or argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Redirect chain loops or is too long
    #[error("redirect limit reached at {hash} after {hops} hops")]
    RedirectLimit { hash: String, hops: usize },

    /// Storage backend error
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    /// Metadata or registry document could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// True for both missing data and data that does not belong to the key.
    ///
    /// Callers at a trust boundary should branch on this instead of the
    /// variant so an outside client cannot tell the two apart.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Integrity(_) => true,
            Self::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        if err.is_integrity_failure() {
            Self::Integrity(err.to_string())
        } else {
            Self::Crypto(err)
        }
    }
}
