//! Share registry
//!
//! A share is a copy of one file re-encrypted under a fresh random key and
//! stored at `shares/<hash>`, where `hash` is the owner's location hash. The
//! global `shares.json` document maps hashes either to a live descriptor or
//! to a redirect naming another hash, so a published handle can be moved to
//! new content without breaking.
//!
//! ```text
//! shares.json
//! ├── 5f0c…  Live { key, blob_location: shares/5f0c…, redirected_from: [a1b2…] }
//! └── a1b2…  Redirect { redirect: 5f0c… }
//! ```

use crate::{location::file_name, Result, Vault, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};
use vaultfs_crypto::{decrypt_blob, encrypt_blob, generate_secret};
use vaultfs_store::join;

/// Registry document at the storage root
pub const SHARES_FILE: &str = "shares.json";

/// Directory holding share copies
pub const SHARES_DIR: &str = "shares";

/// A published file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareDescriptor {
    /// Display name served with the content
    pub name: String,
    /// Always `false`; only files can be shared
    pub is_directory: bool,
    /// The owner's location hash, also the registry key
    pub hash: String,
    /// Owner's concrete location
    pub true_location: String,
    /// Where the re-encrypted copy lives
    pub blob_location: String,
    /// Owner's namespace id
    pub user_hashed_key: String,
    /// Secret the copy is encrypted under
    pub key: String,
    pub created: DateTime<Utc>,
    /// Hashes whose redirects point here
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirected_from: Vec<String>,
}

/// One registry entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShareEntry {
    /// Forward resolution to another hash
    Redirect { redirect: String },
    Live(ShareDescriptor),
}

impl ShareEntry {
    pub fn as_live(&self) -> Option<&ShareDescriptor> {
        match self {
            Self::Live(descriptor) => Some(descriptor),
            Self::Redirect { .. } => None,
        }
    }
}

/// Hash -> entry, for the whole store
pub type ShareRegistry = BTreeMap<String, ShareEntry>;

/// Content served for a resolved share
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedBlob {
    pub blob: Vec<u8>,
    pub name: String,
}

/// Location of the share copy for a hash
pub fn share_blob_location(hash: &str) -> String {
    join(SHARES_DIR, hash)
}

/// Drop `from` from a live entry's back-links
fn unlink_redirect(registry: &mut ShareRegistry, target: &str, from: &str) {
    if let Some(ShareEntry::Live(descriptor)) = registry.get_mut(target) {
        descriptor.redirected_from.retain(|hash| hash != from);
    }
}

/// Remove a live entry and the redirects that point at it
fn remove_live(registry: &mut ShareRegistry, hash: &str) -> Option<ShareDescriptor> {
    let Some(ShareEntry::Live(descriptor)) = registry.remove(hash) else {
        return None;
    };
    for from in &descriptor.redirected_from {
        let points_here = matches!(
            registry.get(from),
            Some(ShareEntry::Redirect { redirect }) if redirect == hash
        );
        if points_here {
            registry.remove(from);
        }
    }
    Some(descriptor)
}

impl Vault {
    /// Load the registry, empty if it has never been written
    pub fn load_registry(&self) -> Result<ShareRegistry> {
        Ok(self.read_json(SHARES_FILE)?.unwrap_or_default())
    }

    /// Read-modify-write the registry under its lock.
    ///
    /// The document is stored only when `f` succeeds and changed it.
    fn update_registry<R>(&self, f: impl FnOnce(&mut ShareRegistry) -> Result<R>) -> Result<R> {
        let _guard = self.registry_lock.lock();
        let mut registry = self.load_registry()?;
        let before = registry.clone();
        let result = f(&mut registry)?;
        if registry != before {
            self.write_json(SHARES_FILE, &registry)?;
        }
        Ok(result)
    }

    fn remove_share_copy(&self, blob_location: &str) -> Result<()> {
        match self.storage.remove_file(blob_location) {
            Err(e) if !e.is_not_found() => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Publish a file. Returns its share hash.
    ///
    /// A location hash belongs to the file it names: a redirect parked at
    /// this hash is dropped and the live share takes its place. A hash that
    /// is already live is a `Conflict`.
    #[instrument(skip(self, key))]
    pub fn create_share(&self, key: &str, virtual_path: &str) -> Result<String> {
        let hash = self.location_hash(key, virtual_path)?;
        let true_location = self.true_location(key, virtual_path)?;
        let name = file_name(virtual_path)
            .ok_or_else(|| VaultError::InvalidInput("cannot share the root".to_string()))?
            .to_string();
        let blob_location = share_blob_location(&hash);

        self.update_registry(|registry| {
            let parked = match registry.get(&hash) {
                Some(ShareEntry::Live(_)) => {
                    return Err(VaultError::Conflict(format!("{hash} is already shared")));
                }
                Some(ShareEntry::Redirect { redirect }) => Some(redirect.clone()),
                None => None,
            };

            // Read under the lock: a write landing after this read refreshes
            // the copy once the lock is free.
            let plaintext = self
                .read_file(key, virtual_path, false)?
                .ok_or_else(|| VaultError::NotFound(virtual_path.to_string()))?;
            let share_key = generate_secret();
            let sealed = encrypt_blob(&self.blob_material(&share_key)?, &plaintext)?;
            self.storage.create_dir_all(SHARES_DIR)?;
            self.storage.write(&blob_location, &sealed)?;

            if let Some(target) = parked {
                debug!(%hash, %target, "replacing redirect with live share");
                unlink_redirect(registry, &target, &hash);
            }
            registry.insert(
                hash.clone(),
                ShareEntry::Live(ShareDescriptor {
                    name,
                    is_directory: false,
                    hash: hash.clone(),
                    true_location,
                    blob_location: blob_location.clone(),
                    user_hashed_key: self.namespace_id(key),
                    key: share_key,
                    created: Utc::now(),
                    redirected_from: Vec::new(),
                }),
            );
            Ok(())
        })?;

        info!(%hash, "share created");
        Ok(hash)
    }

    /// Unpublish a share or drop a redirect.
    ///
    /// Removing a live share also removes the redirects listed in its
    /// back-links and its copy. Only the owner may do either; a redirect
    /// belongs to whoever owns its target. Returns `false` for unknown or
    /// foreign hashes.
    #[instrument(skip(self, key))]
    pub fn remove_share(&self, key: &str, hash: &str) -> Result<bool> {
        let namespace_id = self.namespace_id(key);
        let owns = |registry: &ShareRegistry, hash: &str| {
            registry
                .get(hash)
                .and_then(ShareEntry::as_live)
                .is_some_and(|d| d.user_hashed_key == namespace_id)
        };

        let removed = self.update_registry(|registry| {
            let target = match registry.get(hash) {
                None => return Ok(false),
                Some(ShareEntry::Live(_)) => None,
                Some(ShareEntry::Redirect { redirect }) => Some(redirect.clone()),
            };
            match target {
                None if owns(&*registry, hash) => {
                    if let Some(descriptor) = remove_live(registry, hash) {
                        self.remove_share_copy(&descriptor.blob_location)?;
                    }
                    Ok(true)
                }
                Some(target) if owns(&*registry, &target) => {
                    registry.remove(hash);
                    unlink_redirect(registry, &target, hash);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })?;

        if removed {
            info!("share removed");
        } else {
            debug!("nothing removed");
        }
        Ok(removed)
    }

    /// Fetch shared content by hash, following redirects.
    ///
    /// `None` when the hash is unknown or the copy is gone. Counts a
    /// download against the owner's record.
    #[instrument(skip(self))]
    pub fn resolve_share(&self, hash: &str) -> Result<Option<SharedBlob>> {
        let registry = self.load_registry()?;
        let mut current = hash.to_string();
        let mut visited = HashSet::new();
        let descriptor = loop {
            if visited.len() > self.config.max_redirect_hops || !visited.insert(current.clone()) {
                warn!(%current, hops = visited.len(), "redirect chain does not terminate");
                return Err(VaultError::RedirectLimit {
                    hash: current,
                    hops: visited.len(),
                });
            }
            match registry.get(&current) {
                None => return Ok(None),
                Some(ShareEntry::Redirect { redirect }) => current = redirect.clone(),
                Some(ShareEntry::Live(descriptor)) => break descriptor,
            }
        };

        let sealed = match self.storage.read(&descriptor.blob_location) {
            Ok(sealed) => sealed,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = decrypt_blob(&self.blob_material(&descriptor.key)?, &sealed)?;
        self.record_download(&descriptor.user_hashed_key, &descriptor.hash)?;

        Ok(Some(SharedBlob {
            blob,
            name: descriptor.name.clone(),
        }))
    }

    /// Point `from_hash` at the live share `to_hash`.
    ///
    /// Fails (returns `false`) when the target is not live, the two hashes
    /// are equal, or `from_hash` is itself a live share. An existing
    /// redirect at `from_hash` is retargeted. `from_hash` need not have been
    /// shared before; if its owner later shares that location,
    /// [`Vault::create_share`] replaces the redirect.
    #[instrument(skip(self))]
    pub fn create_redirect(&self, from_hash: &str, to_hash: &str) -> Result<bool> {
        if from_hash == to_hash {
            return Ok(false);
        }
        self.update_registry(|registry| {
            if registry.get(to_hash).and_then(ShareEntry::as_live).is_none() {
                return Ok(false);
            }
            match registry.get(from_hash) {
                Some(ShareEntry::Live(_)) => return Ok(false),
                Some(ShareEntry::Redirect { redirect }) => {
                    let old = redirect.clone();
                    unlink_redirect(registry, &old, from_hash);
                }
                None => {}
            }
            registry.insert(
                from_hash.to_string(),
                ShareEntry::Redirect {
                    redirect: to_hash.to_string(),
                },
            );
            if let Some(ShareEntry::Live(target)) = registry.get_mut(to_hash) {
                target.redirected_from.push(from_hash.to_string());
            }
            Ok(true)
        })
    }

    /// Whether a file is currently published
    pub fn is_shared(&self, key: &str, virtual_path: &str) -> Result<bool> {
        Ok(self.share_info(key, virtual_path)?.is_some())
    }

    /// The live descriptor for a file, if published
    pub fn share_info(&self, key: &str, virtual_path: &str) -> Result<Option<ShareDescriptor>> {
        let hash = self.location_hash(key, virtual_path)?;
        let registry = self.load_registry()?;
        Ok(registry.get(&hash).and_then(ShareEntry::as_live).cloned())
    }

    /// Re-encrypt the share copy of a file the owner just rewrote.
    ///
    /// Runs under the registry lock and seals what is on disk now, so the
    /// last refresh always matches the owner's latest content, and a share
    /// removed meanwhile is not brought back.
    pub(crate) fn refresh_share_copy(&self, key: &str, virtual_path: &str, hash: &str) -> Result<()> {
        self.update_registry(|registry| {
            let Some(descriptor) = registry.get(hash).and_then(ShareEntry::as_live) else {
                return Ok(());
            };
            let Some(plaintext) = self.read_file(key, virtual_path, false)? else {
                return Ok(());
            };
            let sealed = encrypt_blob(&self.blob_material(&descriptor.key)?, &plaintext)?;
            self.storage.create_dir_all(SHARES_DIR)?;
            self.storage.write(&descriptor.blob_location, &sealed)?;
            debug!(%hash, "share copy refreshed");
            Ok(())
        })
    }

    /// Remove every share owned by a namespace. Returns how many were live.
    pub(crate) fn remove_namespace_shares(&self, namespace_id: &str) -> Result<usize> {
        self.update_registry(|registry| {
            let owned: Vec<String> = registry
                .iter()
                .filter_map(|(hash, entry)| {
                    entry
                        .as_live()
                        .filter(|d| d.user_hashed_key == namespace_id)
                        .map(|_| hash.clone())
                })
                .collect();
            for hash in &owned {
                if let Some(descriptor) = remove_live(registry, hash) {
                    self.remove_share_copy(&descriptor.blob_location)?;
                }
            }
            Ok(owned.len())
        })
    }
}
