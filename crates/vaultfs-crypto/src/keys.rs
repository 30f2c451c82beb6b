//! Key material for the vaultfs storage system
//!
//! - [`DerivedKey`]: the cipher key / IV pair produced by the KDF from a user
//!   or share secret
//! - [`generate_secret`]: fresh random secrets used as user keys and share keys

use crate::{CryptoError, Result};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of a nonce / IV in bytes (96 bits for AES-GCM)
pub const NONCE_SIZE: usize = 12;

/// Size of an AEAD authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of a generated secret before hex encoding (128 bits)
pub const SECRET_SIZE: usize = 16;

/// Output length requested from the KDF: key followed by IV
pub const DERIVED_SIZE: usize = KEY_SIZE + NONCE_SIZE;

/// Symmetric material derived from a secret string
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    cipher_key: [u8; KEY_SIZE],
    iv: [u8; NONCE_SIZE],
}

impl DerivedKey {
    /// Split raw KDF output into key and IV
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DERIVED_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "derived material must be {} bytes, got {}",
                DERIVED_SIZE,
                bytes.len()
            )));
        }
        let mut cipher_key = [0u8; KEY_SIZE];
        let mut iv = [0u8; NONCE_SIZE];
        cipher_key.copy_from_slice(&bytes[..KEY_SIZE]);
        iv.copy_from_slice(&bytes[KEY_SIZE..]);
        Ok(Self { cipher_key, iv })
    }

    /// Get the cipher key bytes
    pub fn cipher_key(&self) -> &[u8; KEY_SIZE] {
        &self.cipher_key
    }

    /// Get the IV bytes
    pub fn iv(&self) -> &[u8; NONCE_SIZE] {
        &self.iv
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("cipher_key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random secret as lowercase hex (32 chars)
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_SIZE];
    rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
    let secret = hex::encode(bytes);
    bytes.zeroize();
    secret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_generation() {
        let s1 = generate_secret();
        let s2 = generate_secret();
        assert_ne!(s1, s2);
        assert_eq!(s1.len(), SECRET_SIZE * 2);
    }

    #[test]
    fn test_derived_key_split() {
        let raw: Vec<u8> = (0..DERIVED_SIZE as u8).collect();
        let key = DerivedKey::from_bytes(&raw).unwrap();
        assert_eq!(key.cipher_key()[0], 0);
        assert_eq!(key.iv()[0], KEY_SIZE as u8);
    }

    #[test]
    fn test_derived_key_wrong_length() {
        assert!(DerivedKey::from_bytes(&[0u8; KEY_SIZE]).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = DerivedKey::from_bytes(&[7u8; DERIVED_SIZE]).unwrap();
        let printed = format!("{:?}", key);
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains('7'));
    }
}
