//! Common paths for crosspost data storage
//!
//! Everything lives under `~/.config/crosspost/` on all platforms, or under
//! `$CROSSPOST_HOME` when that is set:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted platform tokens
//! - crosspost.sqlite - Drafts and dispatch history

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable that relocates the data directory
pub const HOME_ENV: &str = "CROSSPOST_HOME";

/// Get the crosspost data directory, creating it if needed
pub fn crosspost_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".config")
            .join("crosspost"),
    };
    fs::create_dir_all(&dir).context("Failed to create crosspost directory")?;
    Ok(dir)
}

/// Get the config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(crosspost_dir()?.join("config.toml"))
}

/// Get the database file path
pub fn database_path() -> Result<PathBuf> {
    Ok(crosspost_dir()?.join("crosspost.sqlite"))
}

/// Get the credentials file path
pub fn credentials_path() -> Result<PathBuf> {
    Ok(crosspost_dir()?.join("credentials.enc"))
}
