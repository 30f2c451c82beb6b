//! Vault configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vaultfs_crypto::KdfParams;

/// Default bound on redirect chains followed by `resolve_share`
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 16;

/// Configuration for a [`crate::Vault`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Storage root for namespaces, the share registry and share copies
    pub root_dir: PathBuf,
    /// Key derivation cost parameters
    pub kdf: KdfParams,
    /// Maximum redirect hops before resolution fails
    pub max_redirect_hops: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./vaultfs-data"),
            kdf: KdfParams::default(),
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
        }
    }
}

impl VaultConfig {
    /// Config rooted at `root_dir` with default parameters
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }
}
