//! Local filesystem storage
//!
//! Every path is resolved under a root directory. File writes go through a
//! temporary file in the target directory and are renamed into place, so a
//! reader never observes a half-written blob or metadata document.

use crate::{validate_path, DirEntry, Result, Storage, StoreError, SEPARATOR};
use bytes::Bytes;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, instrument, warn};

/// Name prefix of in-flight temporary files. Entries carrying it are
/// invisible to listings and do not keep a directory alive.
const TEMP_PREFIX: &str = ".tmp";

/// Storage rooted at a directory on the local filesystem
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open a storage root, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened local storage");
        Ok(Self { root })
    }

    /// The directory this storage is rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        let mut full = self.root.clone();
        if !path.is_empty() {
            full.extend(path.split(SEPARATOR));
        }
        Ok(full)
    }
}

/// Translate an IO error, keeping the storage path for the cases callers match on
fn map_io(err: io::Error, path: &str) -> StoreError {
    match err.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(path.to_string()),
        io::ErrorKind::DirectoryNotEmpty => StoreError::DirectoryNotEmpty(path.to_string()),
        io::ErrorKind::NotADirectory => StoreError::NotADirectory(path.to_string()),
        io::ErrorKind::IsADirectory => StoreError::IsADirectory(path.to_string()),
        _ => StoreError::Io(err),
    }
}

impl Storage for LocalStorage {
    fn read(&self, path: &str) -> Result<Bytes> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(StoreError::IsADirectory(path.to_string()));
        }
        let data = fs::read(&full).map_err(|e| map_io(e, path))?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self, data), fields(len = data.len()))]
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        let dir = full
            .parent()
            .filter(|_| !path.is_empty())
            .ok_or_else(|| StoreError::IsADirectory(path.to_string()))?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(
                crate::parent(path).unwrap_or_default().to_string(),
            ));
        }
        if full.is_dir() {
            return Err(StoreError::IsADirectory(path.to_string()));
        }

        let mut tmp = Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&full).map_err(|e| map_io(e.error, path))?;
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path)?.exists())
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path)?.is_dir())
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| map_io(e, path))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(StoreError::NotADirectory(path.to_string()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| map_io(e, path))? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            let is_dir = entry.file_type()?.is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort();
        Ok(entries)
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(StoreError::IsADirectory(path.to_string()));
        }
        fs::remove_file(&full).map_err(|e| map_io(e, path))
    }

    fn remove_dir(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(StoreError::InvalidPath("cannot remove the storage root".to_string()));
        }
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(StoreError::NotADirectory(path.to_string()));
        }
        if full.is_dir() {
            for entry in fs::read_dir(&full)? {
                let entry = entry?;
                let leftover = entry.file_type()?.is_file()
                    && entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX);
                if !leftover {
                    return Err(StoreError::DirectoryNotEmpty(path.to_string()));
                }
                warn!(dir = %path, file = ?entry.file_name(), "removing interrupted write");
                match fs::remove_file(entry.path()) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                }
            }
        }
        fs::remove_dir(&full).map_err(|e| map_io(e, path))
    }

    #[instrument(skip(self))]
    fn remove_dir_all(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(StoreError::InvalidPath("cannot remove the storage root".to_string()));
        }
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(StoreError::NotADirectory(path.to_string()));
        }
        fs::remove_dir_all(&full).map_err(|e| map_io(e, path))
    }
}
