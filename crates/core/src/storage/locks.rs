use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-file-path mutex registry.
///
/// The only contended resource in the system is the on-disk state: two
/// concurrent record-week calls must not interleave their
/// read-modify-write of the same file. Each distinct path gets its own
/// FIFO-fair mutex (tokio's `Mutex` queues waiters in arrival order), so
/// writers to the same file serialize while unrelated files stay
/// independent. Scoped to the owning tracker, not a process-wide global.
///
/// No cross-process locking — safe only under a single running instance.
#[derive(Debug, Default)]
pub struct PathLocks {
    registry: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `path`, waiting behind earlier claimants.
    /// Relative paths are resolved against the current directory so the
    /// same file always maps to the same lock.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let key = Self::normalize(path);
        let cell = {
            let mut registry = self.registry.lock().await;
            registry.entry(key).or_default().clone()
        };
        cell.lock_owned().await
    }

    fn normalize(path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    }
}
