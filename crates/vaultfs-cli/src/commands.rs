//! Subcommands and their execution

use anyhow::{anyhow, bail, Context};
use chrono::{Duration, Utc};
use clap::Subcommand;
use serde_json::json;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;
use vaultfs_core::{sanitize_virtual_path, Vault, VaultError};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the namespace if needed and print its total size
    Login,
    /// List a folder
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print a file's metadata and share status
    Info { path: String },
    /// Decrypt a file to stdout or `--output`
    Get {
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Don't count this read as a download
        #[arg(long)]
        no_count: bool,
    },
    /// Encrypt and store a file read from `--input` or stdin
    Put {
        path: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Delete a file
    Rm { path: String },
    /// Create a folder
    Mkdir { path: String },
    /// Delete a folder recursively
    Rmdir { path: String },
    /// Publish a file and print its share hash
    Share { path: String },
    /// Remove a share or redirect
    Unshare { hash: String },
    /// Point one share hash at another
    Redirect { from: String, to: String },
    /// Fetch shared content by hash (no key needed)
    Fetch {
        hash: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a user and print its key
    CreateUser {
        /// Purge the user after this many hours
        #[arg(long)]
        lifetime_hours: Option<i64>,
    },
    /// Delete a user and everything it owns
    DestroyUser,
    /// Purge expired temporary users
    Sweep,
}

impl Command {
    /// Whether the command acts on a namespace and so needs a key
    pub fn needs_key(&self) -> bool {
        !matches!(
            self,
            Self::Fetch { .. } | Self::Redirect { .. } | Self::CreateUser { .. } | Self::Sweep
        )
    }
}

fn not_found(what: &str) -> anyhow::Error {
    anyhow!("not found: {what}")
}

/// Collapse missing and undecryptable data into one message
fn hide_integrity<T>(result: vaultfs_core::Result<Option<T>>, what: &str) -> anyhow::Result<T> {
    match result {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(not_found(what)),
        Err(e) if e.is_not_found() => {
            debug!(error = %e, "treating as not found");
            Err(not_found(what))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json(out: &mut impl Write, value: serde_json::Value) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, &value)?;
    writeln!(out)?;
    Ok(())
}

/// Write bytes to `output`, or raw to `out` when no file is given
fn emit_bytes(out: &mut impl Write, output: Option<PathBuf>, bytes: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            print_json(out, json!({ "written": path, "size": bytes.len() }))
        }
        None => Ok(out.write_all(bytes)?),
    }
}

/// Run one command against a vault, writing results to `out`
pub fn run(
    vault: &Vault,
    key: Option<&str>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let key = match (command.needs_key(), key) {
        (true, Some(key)) => key,
        (true, None) => bail!("this command needs a key (--key or VAULTFS_KEY)"),
        (false, _) => "",
    };

    match command {
        Command::Login => print_json(out, json!({ "total_size": vault.login(key)? })),
        Command::Ls { path } => {
            let entries = vault
                .list(key, &sanitize_virtual_path(&path))?
                .unwrap_or_default();
            print_json(out, serde_json::to_value(entries)?)
        }
        Command::Info { path } => {
            let path = sanitize_virtual_path(&path);
            let info = hide_integrity(vault.get_file_info(key, &path), &path)?;
            let shared = vault.is_shared(key, &path)?;
            print_json(out, json!({ "info": info, "is_shared": shared }))
        }
        Command::Get {
            path,
            output,
            no_count,
        } => {
            let path = sanitize_virtual_path(&path);
            let data = hide_integrity(vault.read_file(key, &path, !no_count), &path)?;
            emit_bytes(out, output, &data)
        }
        Command::Put { path, input } => {
            let data = match input {
                Some(file) => std::fs::read(&file)
                    .with_context(|| format!("failed to read {}", file.display()))?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };
            vault.write_file(key, &sanitize_virtual_path(&path), &data)?;
            print_json(out, json!({ "size": data.len() }))
        }
        Command::Rm { path } => {
            let ok = vault.delete_file(key, &sanitize_virtual_path(&path))?;
            print_json(out, json!({ "ok": ok }))
        }
        Command::Mkdir { path } => {
            let ok = vault.create_folder(key, &sanitize_virtual_path(&path))?;
            print_json(out, json!({ "ok": ok }))
        }
        Command::Rmdir { path } => {
            let ok = vault.delete_folder(key, &sanitize_virtual_path(&path))?;
            print_json(out, json!({ "ok": ok }))
        }
        Command::Share { path } => {
            let path = sanitize_virtual_path(&path);
            let hash = match vault.create_share(key, &path) {
                Err(e) if e.is_not_found() => return Err(not_found(&path)),
                other => other?,
            };
            print_json(out, json!({ "hash": hash }))
        }
        Command::Unshare { hash } => {
            let ok = vault.remove_share(key, &hash)?;
            print_json(out, json!({ "ok": ok }))
        }
        Command::Redirect { from, to } => {
            let ok = vault.create_redirect(&from, &to)?;
            print_json(out, json!({ "ok": ok }))
        }
        Command::Fetch { hash, output } => {
            let shared = hide_integrity(vault.resolve_share(&hash), &hash)?;
            if output.is_some() {
                print_json(out, json!({ "name": shared.name }))?;
            }
            emit_bytes(out, output, &shared.blob)
        }
        Command::CreateUser { lifetime_hours } => {
            let key = match lifetime_hours {
                Some(hours) if hours <= 0 => bail!("--lifetime-hours must be positive"),
                Some(hours) => vault.create_temporary_user(Duration::hours(hours))?,
                None => vault.create_user()?,
            };
            print_json(out, json!({ "key": key }))
        }
        Command::DestroyUser => {
            vault.destroy_user(key)?;
            print_json(out, json!({ "ok": true }))
        }
        Command::Sweep => {
            let purged = vault.sweep_expired_users(Utc::now())?;
            print_json(out, json!({ "purged": purged }))
        }
    }
}

/// Whether an error chain ends in a vault not-found or integrity failure
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<VaultError>()
        .is_some_and(VaultError::is_not_found)
        || err.to_string().starts_with("not found")
}
