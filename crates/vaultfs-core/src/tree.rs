//! Folder tree operations over encrypted paths

use crate::{
    location::segments,
    metadata::{FileInfo, FileInfoPatch},
    share::ShareEntry,
    Result, Vault, VaultError,
};
use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, instrument};
use vaultfs_crypto::{decrypt_blob, decrypt_segment, digest, encrypt_blob};
use vaultfs_store::{join, parent};

/// One child in a directory listing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeEntry {
    /// Decrypted name
    pub name: String,
    pub is_directory: bool,
    /// Location hash of the child
    pub hash: String,
    pub is_shared: bool,
    /// Metadata record, for files that have one
    #[serde(flatten)]
    pub info: Option<FileInfo>,
}

impl Vault {
    /// List a directory. `None` if it does not exist or is a file.
    ///
    /// Directories sort before files, then by name.
    #[instrument(skip(self, key))]
    pub fn list(&self, key: &str, virtual_path: &str) -> Result<Option<Vec<TreeEntry>>> {
        let location = self.true_location(key, virtual_path)?;
        if !self.storage.is_dir(&location)? {
            return Ok(None);
        }

        let material = self.material(key)?;
        let registry = self.load_registry()?;
        let infos = self.load_infos(&self.namespace_id(key))?;

        let mut entries = self
            .storage
            .list_dir(&location)?
            .into_iter()
            .map(|entry| -> Result<TreeEntry> {
                let hash = digest(&join(&location, &entry.name));
                Ok(TreeEntry {
                    name: decrypt_segment(&material, &entry.name)?,
                    is_directory: entry.is_dir,
                    is_shared: registry.get(&hash).and_then(ShareEntry::as_live).is_some(),
                    info: if entry.is_dir { None } else { infos.get(&hash).cloned() },
                    hash,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| {
            Reverse(a.is_directory)
                .cmp(&Reverse(b.is_directory))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(Some(entries))
    }

    /// Encrypt and store a file, creating parent folders as needed.
    ///
    /// If the file is shared, the share copy is refreshed too.
    #[instrument(skip(self, key, data), fields(len = data.len()))]
    pub fn write_file(&self, key: &str, virtual_path: &str, data: &[u8]) -> Result<()> {
        if segments(virtual_path).next().is_none() {
            return Err(VaultError::InvalidInput("cannot write to the root".to_string()));
        }
        let location = self.true_location(key, virtual_path)?;
        if let Some(dir) = parent(&location) {
            self.storage.create_dir_all(dir)?;
        }

        let sealed = encrypt_blob(&self.blob_material(key)?, data)?;
        self.storage.write(&location, &sealed)?;

        let hash = digest(&location);
        self.set_file_info_at(
            &self.namespace_id(key),
            &hash,
            Some(FileInfoPatch::written(data.len() as u64)),
        )?;

        self.refresh_share_copy(key, virtual_path, &hash)
    }

    /// Decrypt a file with the owner key. `None` if there is no file there.
    #[instrument(skip(self, key))]
    pub fn read_file(
        &self,
        key: &str,
        virtual_path: &str,
        record_download: bool,
    ) -> Result<Option<Vec<u8>>> {
        let location = self.true_location(key, virtual_path)?;
        if self.storage.is_dir(&location)? {
            return Ok(None);
        }
        let sealed = match self.storage.read(&location) {
            Ok(sealed) => sealed,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let data = decrypt_blob(&self.blob_material(key)?, &sealed)?;

        if record_download {
            self.record_download(&self.namespace_id(key), &digest(&location))?;
        }
        Ok(Some(data))
    }

    /// Remove a file, its share and its metadata. `false` if absent.
    #[instrument(skip(self, key))]
    pub fn delete_file(&self, key: &str, virtual_path: &str) -> Result<bool> {
        let location = self.true_location(key, virtual_path)?;
        if !self.storage.exists(&location)? || self.storage.is_dir(&location)? {
            return Ok(false);
        }
        self.delete_file_at(key, &location)?;
        Ok(true)
    }

    fn delete_file_at(&self, key: &str, location: &str) -> Result<()> {
        self.storage.remove_file(location)?;
        let hash = digest(location);
        let shared = self
            .load_registry()?
            .get(&hash)
            .and_then(ShareEntry::as_live)
            .is_some();
        if shared {
            self.remove_share(key, &hash)?;
        }
        self.set_file_info_at(&self.namespace_id(key), &hash, None)
    }

    /// Create a folder and any missing parents. `false` if something
    /// already exists there.
    #[instrument(skip(self, key))]
    pub fn create_folder(&self, key: &str, virtual_path: &str) -> Result<bool> {
        let location = self.true_location(key, virtual_path)?;
        if self.storage.exists(&location)? {
            return Ok(false);
        }
        self.storage.create_dir_all(&location)?;
        Ok(true)
    }

    /// Delete a folder and everything below it. `false` if absent.
    ///
    /// Files go through the same path as [`Vault::delete_file`], so their
    /// shares and records go with them. The first failure stops the walk
    /// and leaves whatever was not yet deleted in place.
    #[instrument(skip(self, key))]
    pub fn delete_folder(&self, key: &str, virtual_path: &str) -> Result<bool> {
        let location = self.true_location(key, virtual_path)?;
        if !self.storage.is_dir(&location)? {
            return Ok(false);
        }
        self.delete_folder_at(key, &location)?;
        Ok(true)
    }

    fn delete_folder_at(&self, key: &str, location: &str) -> Result<()> {
        for entry in self.storage.list_dir(location)? {
            let child = join(location, &entry.name);
            if entry.is_dir {
                self.delete_folder_at(key, &child)?;
            } else {
                self.delete_file_at(key, &child)?;
            }
        }
        debug!(%location, "removing emptied folder");
        self.storage.remove_dir(location)?;
        Ok(())
    }
}
