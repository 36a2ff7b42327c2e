use std::path::Path;

use crate::errors::CoreError;
use crate::models::snapshot::{IntradaySnapshot, WeekCompletion};

use super::fsutil;

/// Rolling window sizes for the two append-only snapshot files.
/// Oldest entries fall off once the cap is exceeded.
pub const MAX_INTRADAY_SNAPSHOTS: usize = 500;
pub const MAX_WEEK_COMPLETIONS: usize = 260;

/// Append-only JSON arrays of point-in-time valuations, capped at a
/// rolling window of the most recent entries. Absent files are empty.
pub struct SnapshotStore;

impl SnapshotStore {
    pub fn load_intraday(path: &Path) -> Result<Vec<IntradaySnapshot>, CoreError> {
        fsutil::read_json_or_default(path)
    }

    pub fn append_intraday(path: &Path, snapshot: IntradaySnapshot) -> Result<(), CoreError> {
        let mut snapshots = Self::load_intraday(path)?;
        snapshots.push(snapshot);
        trim_to_window(&mut snapshots, MAX_INTRADAY_SNAPSHOTS);
        fsutil::write_json_atomic(path, &snapshots)
    }

    pub fn load_week_completions(path: &Path) -> Result<Vec<WeekCompletion>, CoreError> {
        fsutil::read_json_or_default(path)
    }

    pub fn append_week_completion(
        path: &Path,
        completion: WeekCompletion,
    ) -> Result<(), CoreError> {
        let mut completions = Self::load_week_completions(path)?;
        completions.push(completion);
        trim_to_window(&mut completions, MAX_WEEK_COMPLETIONS);
        fsutil::write_json_atomic(path, &completions)
    }
}

fn trim_to_window<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}
