//! Blob encryption using AES-256-GCM
//!
//! Encrypted blob format (binary):
//! ```text
//! [12 bytes: random nonce][16 bytes: GCM tag][N bytes: ciphertext]
//! ```
//!
//! The same construction seals owner blobs and share copies; only the secret
//! the material was derived from differs.

use crate::{
    keys::{DerivedKey, NONCE_SIZE, TAG_SIZE},
    CryptoError, Result,
};
use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::rngs::OsRng;

/// Bytes added to every plaintext by [`encrypt_blob`]
pub const BLOB_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

fn blob_cipher(material: &DerivedKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(material.cipher_key()).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Encrypt a blob under the given material with a fresh random nonce.
pub fn encrypt_blob(material: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::RngCore::fill_bytes(&mut OsRng, &mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut buffer = plaintext.to_vec();
    let tag = blob_cipher(material)?
        .encrypt_in_place_detached(nonce, b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(format!("blob encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(BLOB_OVERHEAD + buffer.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&buffer);
    Ok(out)
}

/// Decrypt a blob produced by [`encrypt_blob`].
pub fn decrypt_blob(material: &DerivedKey, encrypted: &[u8]) -> Result<Vec<u8>> {
    if encrypted.len() < BLOB_OVERHEAD {
        return Err(CryptoError::InvalidCiphertext(format!(
            "encrypted blob too short: {} bytes (minimum {})",
            encrypted.len(),
            BLOB_OVERHEAD
        )));
    }

    let (nonce_bytes, rest) = encrypted.split_at(NONCE_SIZE);
    let (tag_bytes, ciphertext) = rest.split_at(TAG_SIZE);

    let mut buffer = ciphertext.to_vec();
    blob_cipher(material)?
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce_bytes),
            b"",
            &mut buffer,
            Tag::from_slice(tag_bytes),
        )
        .map_err(|_| CryptoError::Decryption("blob: wrong key, corrupted or tampered data".to_string()))?;

    Ok(buffer)
}
