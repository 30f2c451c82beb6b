//! Hashing utilities using BLAKE3
//!
//! Every externally visible identifier in vaultfs is a [`digest`]:
//! - namespace ids (`digest(key)`)
//! - location hashes (`digest(concrete_location)`)

use std::fmt;

/// Size of a BLAKE3 hash output in bytes (256 bits)
pub const HASH_BYTE_SIZE: usize = 32;

/// Size of a truncated identifier digest in bytes (128 bits)
pub const DIGEST_BYTE_SIZE: usize = 16;

/// Type alias for hash output bytes
pub type HashOutput = [u8; HASH_BYTE_SIZE];

/// A BLAKE3 hash wrapper with convenience methods
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blake3Hash(HashOutput);

impl Blake3Hash {
    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &HashOutput {
        &self.0
    }

    /// Get the first N bytes for use as a prefix
    pub fn prefix(&self, n: usize) -> &[u8] {
        &self.0[..n.min(HASH_BYTE_SIZE)]
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3Hash({})", hex::encode(self.0))
    }
}

impl From<blake3::Hash> for Blake3Hash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

/// Hash the given data using BLAKE3
pub fn hash(data: &[u8]) -> Blake3Hash {
    blake3::hash(data).into()
}

/// Derive a key from the given input and context
pub fn derive_key(context: &str, input: &[u8]) -> Blake3Hash {
    Blake3Hash(blake3::derive_key(context, input))
}

/// Non-keyed 128-bit identifier of a string, hex encoded (32 chars).
///
/// Used for namespace ids and location hashes.
pub fn digest(input: &str) -> String {
    hex::encode(hash(input.as_bytes()).prefix(DIGEST_BYTE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        let data = b"test data";
        assert_eq!(hash(data), hash(data));
        assert_ne!(hash(data), hash(b"other data"));
    }

    #[test]
    fn test_digest_is_hash_prefix() {
        let h = hash(b"test");
        assert_eq!(digest("test"), hex::encode(h.prefix(DIGEST_BYTE_SIZE)));
        assert_eq!(h.prefix(HASH_BYTE_SIZE * 2).len(), HASH_BYTE_SIZE);
    }

    #[test]
    fn test_digest_shape() {
        let d = digest("some-user-key");
        assert_eq!(d.len(), DIGEST_BYTE_SIZE * 2);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(d, digest("some-user-key"));
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        assert_ne!(digest("ab"), digest("ba"));
    }

    #[test]
    fn test_derive_key_contexts() {
        assert_ne!(derive_key("context1", b"input"), derive_key("context2", b"input"));
    }
}
