//! JSON persistence for the two ledgers.
//!
//! Loading a missing file yields the empty collection — first runs start
//! from nothing. A present-but-corrupt file is an error; dropping
//! recorded history silently would be worse than stopping.
//!
//! Saves go through a sibling temp file renamed into place, so the
//! ledger on disk is never half-written.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SizeError};
use crate::ledger::{HistoricLedger, RecentLedger};

/// Load the historic (git-sizes) ledger.
///
/// # Errors
///
/// Fails on unreadable or unparsable files; a missing file is an empty
/// ledger.
pub fn load_history(path: &Path) -> Result<HistoricLedger> {
    load_json(path)
}

/// Load the recent-sizes ledger; missing file is an empty ledger.
pub fn load_recent(path: &Path) -> Result<RecentLedger> {
    load_json(path)
}

/// Save the historic ledger as pretty-printed JSON.
pub fn save_history(ledger: &HistoricLedger, path: &Path) -> Result<()> {
    save_json(ledger, path)
}

/// Save the recent-sizes ledger as pretty-printed JSON.
pub fn save_recent(ledger: &RecentLedger, path: &Path) -> Result<()> {
    save_json(ledger, path)
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let text = fs::read_to_string(path).map_err(|source| SizeError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| SizeError::JsonError {
        path: path.to_path_buf(),
        source,
    })
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| SizeError::IoError {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let text = serde_json::to_string_pretty(value).map_err(|source| SizeError::JsonError {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = path.with_extension("tmp");
    let mut temp_file = File::create(&temp_path).map_err(|source| SizeError::IoError {
        path: temp_path.clone(),
        source,
    })?;
    temp_file
        .write_all(text.as_bytes())
        .and_then(|()| temp_file.write_all(b"\n"))
        .and_then(|()| temp_file.sync_all())
        .map_err(|source| SizeError::IoError {
            path: temp_path.clone(),
            source,
        })?;

    fs::rename(&temp_path, path).map_err(|source| SizeError::IoError {
        path: path.to_path_buf(),
        source,
    })
}
