use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

/// Write `bytes` to `path` atomically: write a sibling temp file, then
/// rename over the target. A crash mid-write never leaves a half-written
/// file behind. Creates parent directories as needed.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Copy the current file aside as `<name>.bak-<YYYYmmdd-HHMMSS>` before
/// an overwrite, enabling single-step undo. No-op when the file does not
/// exist yet. Returns the backup path, if one was made.
pub fn backup_file(path: &Path) -> Result<Option<PathBuf>, CoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup = sibling(path, &format!(".bak-{stamp}"));
    fs::copy(path, &backup)?;
    log::debug!("backed up {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}

/// Most recent `.bak-` sibling of `path`, by timestamp. The stamp format
/// sorts lexicographically, so the max file name wins.
pub fn latest_backup(path: &Path) -> Result<Option<PathBuf>, CoreError> {
    let Some(parent) = path.parent().filter(|p| p.exists()) else {
        return Ok(None);
    };
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let prefix = format!("{file_name}.bak-");

    let mut latest: Option<PathBuf> = None;
    for dir_entry in fs::read_dir(parent)? {
        let candidate = dir_entry?.path();
        let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        let is_newer = latest
            .as_ref()
            .and_then(|l| l.file_name().and_then(|n| n.to_str()))
            .map_or(true, |best| name > best);
        if is_newer {
            latest = Some(candidate);
        }
    }
    Ok(latest)
}

/// Replace `path` with its most recent backup, consuming the backup.
/// Errors with `NothingToUndo` when no backup exists.
pub fn restore_latest_backup(path: &Path) -> Result<(), CoreError> {
    let backup = latest_backup(path)?.ok_or_else(|| {
        CoreError::NothingToUndo(format!("no backup found for {}", path.display()))
    })?;
    fs::rename(&backup, path)?;
    log::info!("restored {} from {}", path.display(), backup.display());
    Ok(())
}

/// Read a JSON file through the deserialization boundary: an absent file
/// is the default value, a present-but-malformed file is a hard error.
pub fn read_json_or_default<T>(path: &Path) -> Result<T, CoreError>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes).map_err(|e| CoreError::MalformedFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Serialize a value as pretty JSON and write it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    atomic_write(path, &bytes)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}{suffix}"))
}
