//! # vaultfs Crypto
//!
//! Cryptographic primitives for the vaultfs encrypted file store.
//!
//! This crate provides:
//! - **Key derivation**: Argon2id with a fixed salt, memoized per secret
//! - **Name encryption**: deterministic AES-SIV tokens for path segments
//! - **Blob encryption**: AES-256-GCM with a random nonce per blob
//! - **BLAKE3**: namespace ids and location hashes
//!
//! ## Security Model
//!
//! The secret string a user holds is the only credential. Everything stored
//! under it (names, bodies) is sealed with material derived from that secret,
//! so the server can serve a namespace only while a caller presents the key.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultfs_crypto::{KeyDeriver, encrypt_segment, encrypt_blob};
//!
//! let deriver = KeyDeriver::default();
//! let material = deriver.derive("my secret")?;
//! let token = encrypt_segment(&material, "report.txt")?;
//! let sealed = encrypt_blob(&deriver.derive_uncached("my secret")?, b"hello")?;
//! ```

pub mod error;
pub mod hashing;
pub mod kdf;
pub mod keys;
pub mod names;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use hashing::{digest, Blake3Hash};
pub use kdf::{KdfParams, KeyDeriver};
pub use keys::{generate_secret, DerivedKey};
pub use names::{decrypt_segment, encrypt_segment};
pub use symmetric::{decrypt_blob, encrypt_blob};
