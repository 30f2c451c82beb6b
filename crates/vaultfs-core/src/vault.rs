//! The vault context shared by every operation
//!
//! A [`Vault`] owns the storage backend, the memoizing key deriver and the
//! locks that serialize document rewrites. It holds no per-user state: every
//! operation takes the caller's key and recomputes what it needs from it.

use crate::{config::VaultConfig, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;
use vaultfs_crypto::{digest, DerivedKey, KeyDeriver};
use vaultfs_store::{LocalStorage, Storage};

/// Encrypted virtual filesystem and share engine over a storage backend
pub struct Vault {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) deriver: KeyDeriver,
    pub(crate) config: VaultConfig,
    /// Guards `shares.json`
    pub(crate) registry_lock: Mutex<()>,
    /// Guards each namespace's `infos.json`
    info_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Vault {
    /// Open a vault on the local filesystem at `config.root_dir`
    pub fn open(config: VaultConfig) -> Result<Self> {
        let storage = LocalStorage::open(&config.root_dir)?;
        Ok(Self::with_storage(Arc::new(storage), config))
    }

    /// Create a vault over an arbitrary storage backend
    pub fn with_storage(storage: Arc<dyn Storage>, config: VaultConfig) -> Self {
        debug!(kdf = ?config.kdf, hops = config.max_redirect_hops, "vault ready");
        Self {
            storage,
            deriver: KeyDeriver::new(config.kdf),
            config,
            registry_lock: Mutex::new(()),
            info_locks: DashMap::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Get the storage backend
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Namespace id for a key: the name of its root directory
    pub fn namespace_id(&self, key: &str) -> String {
        digest(key)
    }

    /// Memoized material for path segment encryption
    pub(crate) fn material(&self, key: &str) -> Result<Arc<DerivedKey>> {
        Ok(self.deriver.derive(key)?)
    }

    /// Fresh material for blob encryption
    pub(crate) fn blob_material(&self, key: &str) -> Result<DerivedKey> {
        Ok(self.deriver.derive_uncached(key)?)
    }

    pub(crate) fn info_lock(&self, namespace_id: &str) -> Arc<Mutex<()>> {
        self.info_locks
            .entry(namespace_id.to_string())
            .or_default()
            .clone()
    }

    /// Read a JSON document, `None` if it does not exist
    pub(crate) fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.storage.read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite a JSON document in full
    pub(crate) fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
        if let Some(parent) = vaultfs_store::parent(path) {
            self.storage.create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(value)?;
        self.storage.write(path, &bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("deriver", &self.deriver)
            .finish_non_exhaustive()
    }
}
