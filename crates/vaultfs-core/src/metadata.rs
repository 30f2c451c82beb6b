//! Per-namespace file metadata
//!
//! Each namespace keeps one `infos.json` document mapping location hashes to
//! [`FileInfo`] records. The document is rewritten in full on every change,
//! under the namespace's lock.

use crate::{Result, Vault};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use vaultfs_store::join;

/// Metadata document name under each namespace root
pub const INFOS_FILE: &str = "infos.json";

/// Names an extra field may not take; they would shadow record or listing fields
const RESERVED_FIELDS: &[&str] = &["size", "time", "downloads", "name", "is_directory", "hash", "is_shared"];

/// Size, write time and download history of one stored file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Plaintext size in bytes of the last write
    pub size: u64,
    /// Time of the last write
    pub time: DateTime<Utc>,
    /// One timestamp per recorded download
    #[serde(default)]
    pub downloads: Vec<DateTime<Utc>>,
    /// Caller-defined fields, kept across writes
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileInfo {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            size: 0,
            time: now,
            downloads: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Merge a patch into this record. Fields the patch leaves unset are kept.
    pub fn apply(&mut self, patch: FileInfoPatch) {
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(downloads) = patch.downloads {
            self.downloads = downloads;
        }
        self.extra.extend(
            patch
                .extra
                .into_iter()
                .filter(|(name, _)| !RESERVED_FIELDS.contains(&name.as_str())),
        );
    }
}

/// Partial update for a [`FileInfo`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<Vec<DateTime<Utc>>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileInfoPatch {
    /// The patch applied after a blob write
    pub fn written(size: u64) -> Self {
        Self {
            size: Some(size),
            time: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Add a caller-defined field
    pub fn with_extra(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// Location hash -> record, for one namespace
pub type UserInfos = BTreeMap<String, FileInfo>;

impl Vault {
    fn infos_path(namespace_id: &str) -> String {
        join(namespace_id, INFOS_FILE)
    }

    pub(crate) fn load_infos(&self, namespace_id: &str) -> Result<UserInfos> {
        Ok(self
            .read_json(&Self::infos_path(namespace_id))?
            .unwrap_or_default())
    }

    /// Read-modify-write the namespace's document under its lock.
    ///
    /// `f` sees `None` when no document exists yet and returns whether it
    /// changed anything; unchanged documents are not rewritten.
    fn update_infos<R>(
        &self,
        namespace_id: &str,
        f: impl FnOnce(&mut Option<UserInfos>) -> (R, bool),
    ) -> Result<R> {
        let lock = self.info_lock(namespace_id);
        let _guard = lock.lock();
        let path = Self::infos_path(namespace_id);
        let mut document: Option<UserInfos> = self.read_json(&path)?;
        let (result, dirty) = f(&mut document);
        if let (true, Some(infos)) = (dirty, &document) {
            self.write_json(&path, infos)?;
        }
        Ok(result)
    }

    /// All metadata records of a namespace
    pub fn get_user_infos(&self, key: &str) -> Result<UserInfos> {
        self.load_infos(&self.namespace_id(key))
    }

    /// Replace the whole metadata document
    #[instrument(skip(self, key, infos), fields(records = infos.len()))]
    pub fn set_user_infos(&self, key: &str, infos: &UserInfos) -> Result<()> {
        let namespace_id = self.namespace_id(key);
        let lock = self.info_lock(&namespace_id);
        let _guard = lock.lock();
        self.write_json(&Self::infos_path(&namespace_id), infos)
    }

    /// Merge `patch` into a file's record, or delete the record with `None`
    pub fn set_file_info(
        &self,
        key: &str,
        virtual_path: &str,
        patch: Option<FileInfoPatch>,
    ) -> Result<()> {
        let hash = self.location_hash(key, virtual_path)?;
        self.set_file_info_at(&self.namespace_id(key), &hash, patch)
    }

    pub(crate) fn set_file_info_at(
        &self,
        namespace_id: &str,
        hash: &str,
        patch: Option<FileInfoPatch>,
    ) -> Result<()> {
        self.update_infos(namespace_id, |document| match patch {
            Some(patch) => {
                document
                    .get_or_insert_with(UserInfos::new)
                    .entry(hash.to_string())
                    .or_insert_with(|| FileInfo::empty(Utc::now()))
                    .apply(patch);
                ((), true)
            }
            None => {
                let removed = document
                    .as_mut()
                    .is_some_and(|infos| infos.remove(hash).is_some());
                ((), removed)
            }
        })
    }

    /// A file's record, if any
    pub fn get_file_info(&self, key: &str, virtual_path: &str) -> Result<Option<FileInfo>> {
        let hash = self.location_hash(key, virtual_path)?;
        Ok(self.get_user_infos(key)?.remove(&hash))
    }

    /// Sum of recorded sizes in a namespace
    pub fn user_total_size(&self, key: &str) -> Result<u64> {
        Ok(self.get_user_infos(key)?.values().map(|info| info.size).sum())
    }

    /// Append a download timestamp to a record.
    ///
    /// Takes the namespace id rather than a key so share resolution can
    /// record against the owner. Returns `false` without writing when the
    /// document or the record does not exist.
    #[instrument(skip(self))]
    pub fn record_download(&self, namespace_id: &str, location_hash: &str) -> Result<bool> {
        let recorded = self.update_infos(namespace_id, |infos| {
            match infos.as_mut().and_then(|infos| infos.get_mut(location_hash)) {
                Some(info) => {
                    info.downloads.push(Utc::now());
                    (true, true)
                }
                None => (false, false),
            }
        })?;
        if !recorded {
            debug!("no metadata record to count download against");
        }
        Ok(recorded)
    }
}
