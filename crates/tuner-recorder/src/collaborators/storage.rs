use crate::model::{RecordedProgramHandle, RecordedProgramRecord};

use std::path::PathBuf;

/// Storage quota policy.
pub trait StorageSufficiencyOracle: Send + Sync {
    /// Enough free space exists to start or continue recording.
    fn is_sufficient(&self) -> bool;

    /// Directory under which per-recording directories are created.
    fn recording_root_directory(&self) -> PathBuf;
}

/// Persisted store of recorded programs.
pub trait RecordedProgramStore: Send + Sync {
    /// Insert a row, returning its handle, or `None` when the insert failed.
    fn insert(&self, record: &RecordedProgramRecord) -> Option<RecordedProgramHandle>;
}
