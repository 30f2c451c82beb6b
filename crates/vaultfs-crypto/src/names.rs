//! AES-SIV path segment encryption
//!
//! Segment encryption must be deterministic: the same name under the same key
//! always maps to the same on-disk token, so a directory can be re-addressed
//! from a remembered virtual path without decrypting anything. AES-SIV gives
//! that with authentication and without the nonce-reuse hazard of a fixed-IV
//! GCM construction.
//!
//! Token format: URL-safe base64 (no padding) of `siv_tag (16) ‖ ciphertext`.

use crate::{keys::DerivedKey, keys::TAG_SIZE, CryptoError, Result};
use aes_siv::{
    aead::{Aead, KeyInit, Payload},
    Aes256SivAead, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

const SIV_KEY_INFO: &[u8] = b"vaultfs-segment-siv";

fn segment_cipher(material: &DerivedKey) -> Result<Aes256SivAead> {
    // AES-256-SIV needs a 64-byte key (two 32-byte sub-keys)
    let mut double_key = [0u8; 64];
    Hkdf::<Sha256>::new(None, material.cipher_key())
        .expand(SIV_KEY_INFO, &mut double_key)
        .map_err(|e| CryptoError::InvalidKey(format!("HKDF expand for AES-SIV: {e}")))?;
    let cipher = Aes256SivAead::new_from_slice(&double_key)
        .map_err(|e| CryptoError::InvalidKey(format!("AES-SIV key: {e}")));
    double_key.zeroize();
    cipher
}

/// Encrypt one path segment into a filesystem-safe token.
pub fn encrypt_segment(material: &DerivedKey, plaintext: &str) -> Result<String> {
    let cipher = segment_cipher(material)?;
    let ciphertext = cipher
        .encrypt(
            &Nonce::default(),
            Payload {
                msg: plaintext.as_bytes(),
                aad: material.iv(),
            },
        )
        .map_err(|e| CryptoError::Encryption(format!("segment encryption failed: {e}")))?;

    Ok(URL_SAFE_NO_PAD.encode(ciphertext))
}

/// Decrypt a token produced by [`encrypt_segment`].
///
/// Fails with [`CryptoError::Decryption`] when the token was sealed under a
/// different key.
pub fn decrypt_segment(material: &DerivedKey, token: &str) -> Result<String> {
    let ciphertext = URL_SAFE_NO_PAD.decode(token)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::InvalidCiphertext(format!(
            "segment token too short: {} bytes",
            ciphertext.len()
        )));
    }

    let cipher = segment_cipher(material)?;
    let plaintext = cipher
        .decrypt(
            &Nonce::default(),
            Payload {
                msg: &ciphertext,
                aad: material.iv(),
            },
        )
        .map_err(|_| CryptoError::Decryption("segment: wrong key or corrupted token".to_string()))?;

    Ok(String::from_utf8(plaintext)?)
}
