//! Snapshot Codec
//!
//! Reads and writes the full dataset as pretty-printed JSON.

use crate::engine::models::DataContainer;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Highest `fileVersion` this build understands.
pub const SUPPORTED_FILE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot file version {found} not supported (max: {max})")]
    UnsupportedVersion { found: u32, max: u32 },

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

/// Writes `container` to `path`, replacing whatever was there.
pub fn export_snapshot(path: &Path, container: &DataContainer) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(container)?;
    fs::write(path, content)?;
    debug!(
        path = %path.display(),
        cars = container.cars.len(),
        fuel_types = container.fuel_types.len(),
        "Snapshot written"
    );
    Ok(())
}

/// Reads the snapshot at `path`.
///
/// `Ok(None)` means there is no file; a file that exists but cannot be used
/// is an error carrying the cause.
pub fn read_snapshot(path: &Path) -> Result<Option<DataContainer>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let container: DataContainer = serde_json::from_str(&content)?;

    if let Some(found) = container.file_version {
        if found > SUPPORTED_FILE_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found,
                max: SUPPORTED_FILE_VERSION,
            });
        }
    }

    Ok(Some(container))
}

/// Best-effort variant of [`read_snapshot`]: an unreadable file is logged and
/// treated the same as a missing one.
pub fn import_snapshot(path: &Path) -> Option<DataContainer> {
    match read_snapshot(path) {
        Ok(Some(container)) => Some(container),
        Ok(None) => {
            debug!(path = %path.display(), "No snapshot file found");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable snapshot");
            None
        }
    }
}
