use std::path::Path;

use crate::errors::CoreError;
use crate::models::entry::WeeklyEntry;

use super::fsutil;

/// Load/append/pop for a weekly ledger file (a JSON array of entries).
///
/// The ledger is rewritten wholesale on every change — entries are small
/// and the file is the unit of atomicity. A missing file is an empty
/// ledger, never an error.
pub struct EntryStore;

impl EntryStore {
    /// Load all entries. Absent file → empty; malformed file → error.
    pub fn load(path: &Path) -> Result<Vec<WeeklyEntry>, CoreError> {
        fsutil::read_json_or_default(path)
    }

    /// Append one entry and rewrite the ledger atomically.
    pub fn append(path: &Path, entry: WeeklyEntry) -> Result<(), CoreError> {
        let mut entries = Self::load(path)?;
        entries.push(entry);
        fsutil::write_json_atomic(path, &entries)?;
        log::info!(
            "appended weekly entry to {} ({} total)",
            path.display(),
            entries.len()
        );
        Ok(())
    }

    /// Pop the most recent entry (undo), rewriting the ledger. Returns
    /// `None` when the ledger is empty.
    pub fn pop_last(path: &Path) -> Result<Option<WeeklyEntry>, CoreError> {
        let mut entries = Self::load(path)?;
        let popped = entries.pop();
        if popped.is_some() {
            fsutil::write_json_atomic(path, &entries)?;
        }
        Ok(popped)
    }
}
