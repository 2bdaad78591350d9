//! Common paths for Rookery data storage
//!
//! All Rookery data is stored under ~/.config/rookery/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted platform tokens
//! - orgs/<organization>.sqlite - One database per organization

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Rookery data directory (~/.config/rookery/)
///
/// This is consistent across all platforms for simplicity.
pub fn rookery_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let rookery_dir = home.join(".config").join("rookery");
    fs::create_dir_all(&rookery_dir).context("Failed to create rookery directory")?;
    Ok(rookery_dir)
}

/// Get the config file path (~/.config/rookery/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(rookery_dir()?.join("config.toml"))
}

/// Get the credentials file path (~/.config/rookery/credentials.enc)
pub fn credentials_path() -> Result<PathBuf> {
    Ok(rookery_dir()?.join("credentials.enc"))
}

/// Get the per-organization database directory (~/.config/rookery/orgs/)
pub fn orgs_dir() -> Result<PathBuf> {
    let dir = rookery_dir()?.join("orgs");
    fs::create_dir_all(&dir).context("Failed to create orgs directory")?;
    Ok(dir)
}

/// Get the database path for one organization
///
/// Each organization is a tenant boundary with its own SQLite file.
pub fn organization_db_path(organization: &str) -> Result<PathBuf> {
    Ok(orgs_dir()?.join(format!("{organization}.sqlite")))
}

/// List the organizations that have a database file
pub fn list_organizations() -> Result<Vec<String>> {
    let mut orgs = Vec::new();

    for entry in fs::read_dir(orgs_dir()?).context("Failed to read orgs directory")? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "sqlite")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            orgs.push(stem.to_string());
        }
    }

    orgs.sort();
    Ok(orgs)
}
