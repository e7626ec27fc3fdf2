//! Storage location resolution.
//!
//! The store lives at `<root>/eldar/eldar.db`, where `<root>` is the user's
//! config directory on desktop platforms and the app-private data directory on
//! mobile. `ELDAR_DATA_DIR` overrides the root everywhere.

use std::path::{Path, PathBuf};

use crate::store::StoreError;

/// Application name used for the storage directory
pub const APP_NAME: &str = "eldar";

/// Store file name
pub const DATABASE_FILE: &str = "eldar.db";

/// Log file name, written next to the store
pub const LOG_FILE: &str = "eldar.log";

/// Environment variable overriding the storage root
pub const DATA_DIR_ENV: &str = "ELDAR_DATA_DIR";

/// Resolve the root directory that holds the `eldar` directory.
pub fn storage_root() -> Result<PathBuf, StoreError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform_root()
}

#[cfg(any(target_os = "android", target_os = "ios"))]
fn platform_root() -> Result<PathBuf, StoreError> {
    dirs::data_dir()
        .or_else(dirs::config_dir)
        .ok_or(StoreError::NoStorageRoot)
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
fn platform_root() -> Result<PathBuf, StoreError> {
    let root = dirs::config_dir().ok_or(StoreError::NoStorageRoot)?;
    ensure_accessible(&root)?;
    Ok(root)
}

/// The root must already exist and be a readable directory.
fn ensure_accessible(dir: &Path) -> Result<(), StoreError> {
    let unavailable = |source| StoreError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(dir).map_err(unavailable)?;
    if !metadata.is_dir() {
        return Err(unavailable(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not a directory",
        )));
    }
    Ok(())
}

pub fn app_dir() -> Result<PathBuf, StoreError> {
    Ok(storage_root()?.join(APP_NAME))
}

pub fn database_path() -> Result<PathBuf, StoreError> {
    Ok(app_dir()?.join(DATABASE_FILE))
}

pub fn log_path() -> Result<PathBuf, StoreError> {
    Ok(app_dir()?.join(LOG_FILE))
}
