//! # vaultfs CLI
//!
//! Command-line front end for a vaultfs store. Every core operation is one
//! subcommand; results are printed as JSON, file contents as raw bytes.
//!
//! ## Usage
//!
//! ```bash
//! vaultfs --root ./data create-user
//! VAULTFS_KEY=<key> vaultfs put docs/report.txt --input report.txt
//! VAULTFS_KEY=<key> vaultfs share docs/report.txt
//! vaultfs fetch <hash> --output report.txt
//! ```

pub mod commands;
pub mod config;

pub use commands::{run, Command};
pub use config::load_config;
