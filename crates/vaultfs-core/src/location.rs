//! Virtual to concrete path resolution
//!
//! A virtual path such as `docs/report.txt` maps to
//! `<namespace_id>/files/<token>/<token>`, one AES-SIV token per segment. The
//! mapping is deterministic for a key, so directories can be created, listed
//! and removed with ordinary storage calls and nothing needs decrypting to
//! find a file again.

use crate::{Result, Vault, VaultError};
use vaultfs_crypto::{decrypt_segment, digest, encrypt_segment, DerivedKey};
use vaultfs_store::SEPARATOR;

/// Directory under each namespace root holding the encrypted tree
pub const FILES_DIR: &str = "files";

/// Longest token a single directory entry may have
pub const MAX_TOKEN_LEN: usize = 255;

/// Strip empty, `.` and `..` segments from a caller-supplied path.
///
/// The resolver does not normalize; boundaries run this first.
pub fn sanitize_virtual_path(raw: &str) -> String {
    segments(raw)
        .filter(|s| *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Non-empty segments of a virtual path
pub(crate) fn segments(virtual_path: &str) -> impl Iterator<Item = &str> {
    virtual_path.split('/').filter(|s| !s.is_empty())
}

/// Last segment of a virtual path, used as a display name
pub(crate) fn file_name(virtual_path: &str) -> Option<&str> {
    segments(virtual_path).last()
}

pub(crate) fn encrypt_token(material: &DerivedKey, segment: &str) -> Result<String> {
    let token = encrypt_segment(material, segment)?;
    if token.len() > MAX_TOKEN_LEN {
        return Err(VaultError::InvalidInput(format!(
            "name too long: {} bytes encrypted",
            token.len()
        )));
    }
    Ok(token)
}

impl Vault {
    /// `<namespace_id>/files`
    pub(crate) fn files_root(&self, key: &str) -> String {
        format!("{}{SEPARATOR}{FILES_DIR}", self.namespace_id(key))
    }

    /// Concrete storage path for a virtual path
    pub fn true_location(&self, key: &str, virtual_path: &str) -> Result<String> {
        let material = self.material(key)?;
        let mut location = self.files_root(key);
        for segment in segments(virtual_path) {
            location.push(SEPARATOR);
            location.push_str(&encrypt_token(&material, segment)?);
        }
        Ok(location)
    }

    /// Stable identifier of a virtual path under a key
    pub fn location_hash(&self, key: &str, virtual_path: &str) -> Result<String> {
        Ok(digest(&self.true_location(key, virtual_path)?))
    }

    /// Inverse of [`Vault::true_location`]
    pub fn decrypt_location(&self, key: &str, concrete_path: &str) -> Result<String> {
        let root = self.files_root(key);
        let rest = concrete_path
            .strip_prefix(root.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with(SEPARATOR))
            .ok_or_else(|| {
                VaultError::InvalidInput(format!("{concrete_path} is outside this namespace"))
            })?;

        let material = self.material(key)?;
        let names = rest
            .split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|token| decrypt_segment(&material, token))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names.join("/"))
    }
}
