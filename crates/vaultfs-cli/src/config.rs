//! Configuration loading
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `VAULTFS__*` environment variables (`VAULTFS__ROOT_DIR`,
//! `VAULTFS__KDF__MEM_COST_KIB`, ...). Command-line flags are applied on top
//! by the caller.

use anyhow::Context;
use config::{Config, Environment, File};
use std::path::Path;
use vaultfs_core::VaultConfig;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "VAULTFS";

/// Load the vault configuration from `path` (if given) and the environment
pub fn load_config(path: Option<&Path>) -> anyhow::Result<VaultConfig> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("vaultfs").required(false),
    };
    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to read configuration")?;

    settings
        .try_deserialize()
        .context("invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "root_dir = \"/srv/vault\"\nmax_redirect_hops = 4\n\n[kdf]\ntime_cost = 3"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/srv/vault"));
        assert_eq!(config.max_redirect_hops, 4);
        assert_eq!(config.kdf.time_cost, 3);
        assert_eq!(config.kdf.mem_cost_kib, VaultConfig::default().kdf.mem_cost_kib);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/vaultfs.toml"))).is_err());
    }
}
