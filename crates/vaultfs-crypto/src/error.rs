//! Error types for the vaultfs-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key derivation failed (bad parameters or resource exhaustion)
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed: wrong key, tampered or corrupted data
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid ciphertext format
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Invalid key format or length
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Base64 decode error
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Decrypted bytes were not valid UTF-8
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl CryptoError {
    /// True when the failure means "this data was not sealed under this key"
    /// (authentication mismatch or a token that cannot be ciphertext at all).
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::Decryption(_) | Self::InvalidCiphertext(_) | Self::Base64Decode(_) | Self::InvalidUtf8(_)
        )
    }
}
