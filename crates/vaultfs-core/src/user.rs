//! User namespaces
//!
//! A user is nothing more than a key and the directory its hash names. The
//! profile document only records when the namespace was created and, for
//! temporary users, when it should be swept.

use crate::{share::SHARES_DIR, Result, Vault};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use vaultfs_crypto::generate_secret;
use vaultfs_store::join;

/// Profile document name under each namespace root
pub const USER_FILE: &str = "user.json";

/// Profile written when a user is created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub created: DateTime<Utc>,
    /// Temporary users are purged by the sweep after this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl Vault {
    /// Create a permanent user and return its key
    pub fn create_user(&self) -> Result<String> {
        self.create_user_with(None)
    }

    /// Create a user that [`Vault::sweep_expired_users`] purges after `lifetime`
    pub fn create_temporary_user(&self, lifetime: Duration) -> Result<String> {
        self.create_user_with(Some(Utc::now() + lifetime))
    }

    fn create_user_with(&self, expires_at: Option<DateTime<Utc>>) -> Result<String> {
        let key = generate_secret();
        let namespace_id = self.namespace_id(&key);
        self.storage.create_dir_all(&self.files_root(&key))?;
        self.write_json(
            &join(&namespace_id, USER_FILE),
            &UserProfile {
                created: Utc::now(),
                expires_at,
            },
        )?;
        info!(namespace = %namespace_id, ?expires_at, "user created");
        Ok(key)
    }

    /// Whether a namespace exists for this key
    pub fn user_exists(&self, key: &str) -> Result<bool> {
        Ok(self.storage.is_dir(&self.namespace_id(key))?)
    }

    /// The user's profile, absent for namespaces created by a bare login
    pub fn user_profile(&self, key: &str) -> Result<Option<UserProfile>> {
        self.read_json(&join(&self.namespace_id(key), USER_FILE))
    }

    /// Ensure the namespace exists and return its total stored size
    #[instrument(skip(self, key))]
    pub fn login(&self, key: &str) -> Result<u64> {
        self.storage.create_dir_all(&self.files_root(key))?;
        self.user_total_size(key)
    }

    /// Delete everything a user owns. Missing pieces are skipped.
    ///
    /// A walk that fails partway is logged and the namespace directory is
    /// removed wholesale anyway.
    #[instrument(skip(self, key))]
    pub fn destroy_user(&self, key: &str) -> Result<()> {
        let namespace_id = self.namespace_id(key);
        if let Err(e) = self.delete_folder(key, "") {
            warn!(namespace = %namespace_id, error = %e, "file walk failed, purging namespace");
        }
        self.purge_namespace(&namespace_id)?;
        info!(namespace = %namespace_id, "user destroyed");
        Ok(())
    }

    /// Drop a namespace's shares and its root directory
    fn purge_namespace(&self, namespace_id: &str) -> Result<()> {
        self.remove_namespace_shares(namespace_id)?;
        match self.storage.remove_dir_all(namespace_id) {
            Err(e) if !e.is_not_found() => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Purge every temporary user whose lifetime ended before `now`.
    ///
    /// Works from the profile documents alone, so no keys are needed.
    /// Returns the purged namespace ids.
    #[instrument(skip(self))]
    pub fn sweep_expired_users(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let mut purged = Vec::new();
        for entry in self.storage.list_dir("")? {
            if !entry.is_dir || entry.name == SHARES_DIR {
                continue;
            }
            let profile = match self.read_json::<UserProfile>(&join(&entry.name, USER_FILE)) {
                Ok(Some(profile)) => profile,
                Ok(None) => continue,
                Err(e) => {
                    warn!(namespace = %entry.name, error = %e, "unreadable user profile");
                    continue;
                }
            };
            if profile.is_expired(now) {
                self.purge_namespace(&entry.name)?;
                purged.push(entry.name);
            }
        }
        if !purged.is_empty() {
            info!(count = purged.len(), "expired users swept");
        }
        Ok(purged)
    }
}
