//! vaultfs - encrypted file store with shareable links

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaultfs_cli::{commands::is_not_found, load_config, run, Command};
use vaultfs_core::Vault;

#[derive(Parser, Debug)]
#[command(name = "vaultfs")]
#[command(about = "Encrypted virtual filesystem with shareable links")]
#[command(version)]
struct Args {
    /// Storage root (overrides the configuration file)
    #[arg(short, long, env = "VAULTFS_ROOT")]
    root: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "VAULTFS_CONFIG")]
    config: Option<PathBuf>,

    /// Secret key of the namespace to operate on
    #[arg(short, long, env = "VAULTFS_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "VAULTFS_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr; stdout carries command output
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vaultfs_cli={log_level},vaultfs_core={log_level},vaultfs_store={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.root_dir = root;
    }
    tracing::debug!(root = %config.root_dir.display(), "using storage root");

    let vault = Vault::open(config).context("failed to open storage root")?;
    let mut stdout = std::io::stdout().lock();
    match run(&vault, args.key.as_deref(), args.command, &mut stdout) {
        Err(e) if is_not_found(&e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
        other => other,
    }
}
