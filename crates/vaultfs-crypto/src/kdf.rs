//! Key derivation: Argon2id secret → cipher key / IV
//!
//! The salt is fixed and shared across every namespace. A secret is therefore
//! all that is needed to re-derive a namespace's material, which is what makes
//! the key itself the account.

use crate::{
    hashing::{derive_key, HashOutput},
    keys::{DerivedKey, DERIVED_SIZE},
    CryptoError, Result,
};
use argon2::{Algorithm, Argon2, Params, Version};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroize;

/// Fixed salt for every derivation
pub const KDF_SALT: &[u8] = b"vaultfs/v1/fixed-salt";

const CACHE_CONTEXT: &str = "vaultfs 2024-06 kdf memo index";

/// Argon2id parameters for KDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Derive key material from a secret with Argon2id and the fixed salt.
pub fn derive(secret: &str, params: &KdfParams) -> Result<DerivedKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(DERIVED_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut out = [0u8; DERIVED_SIZE];
    argon2
        .hash_password_into(secret.as_bytes(), KDF_SALT, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(format!("Argon2id failed: {e}")))?;

    let material = DerivedKey::from_bytes(&out);
    out.zeroize();
    material
}

/// Memoizing front for [`derive`].
///
/// Entries are never evicted; the number of distinct secrets seen by one
/// process is bounded by its active sessions. The index is a BLAKE3
/// derive-key digest of the secret so the map never holds secrets in clear.
pub struct KeyDeriver {
    params: KdfParams,
    cache: DashMap<HashOutput, Arc<DerivedKey>>,
}

impl KeyDeriver {
    /// Create a deriver with the given parameters
    pub fn new(params: KdfParams) -> Self {
        Self {
            params,
            cache: DashMap::new(),
        }
    }

    /// The parameters every derivation uses
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive with memoization. Used for per-segment path translation.
    pub fn derive(&self, secret: &str) -> Result<Arc<DerivedKey>> {
        let index = *derive_key(CACHE_CONTEXT, secret.as_bytes()).as_bytes();
        if let Some(hit) = self.cache.get(&index) {
            return Ok(Arc::clone(hit.value()));
        }

        tracing::debug!("deriving key material (cache miss)");
        let material = Arc::new(derive(secret, &self.params)?);
        self.cache.insert(index, Arc::clone(&material));
        Ok(material)
    }

    /// Derive without touching the cache. Used for blob encryption.
    pub fn derive_uncached(&self, secret: &str) -> Result<DerivedKey> {
        derive(secret, &self.params)
    }

    /// Number of memoized secrets
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(KdfParams::default())
    }
}

impl std::fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDeriver")
            .field("params", &self.params)
            .field("cached", &self.cache.len())
            .finish()
    }
}
