use crate::model::ProgramUri;

use std::path::{Path, PathBuf};

/// Storage directory and physical time bounds of one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingWindow {
    storage_dir: PathBuf,
    start_time_utc_millis: i64,
    end_time_utc_millis: Option<i64>,
    program_uri: Option<ProgramUri>,
}

impl RecordingWindow {
    /// Open a window that starts now-ish at `start_time_utc_millis`.
    pub fn open(
        storage_dir: PathBuf,
        start_time_utc_millis: i64,
        program_uri: Option<ProgramUri>,
    ) -> Self {
        Self {
            storage_dir,
            start_time_utc_millis,
            end_time_utc_millis: None,
            program_uri,
        }
    }

    /// Close the window. Ends earlier than the start are clamped to the start.
    pub fn close(&mut self, end_time_utc_millis: i64) {
        self.end_time_utc_millis = Some(end_time_utc_millis.max(self.start_time_utc_millis));
    }

    /// Directory holding the recorded samples.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// `file://` URI of the storage directory.
    pub fn storage_uri(&self) -> String {
        format!("file://{}", self.storage_dir.display())
    }

    /// Physical start, UTC milliseconds.
    pub fn start_time_utc_millis(&self) -> i64 {
        self.start_time_utc_millis
    }

    /// Physical end, once closed.
    pub fn end_time_utc_millis(&self) -> Option<i64> {
        self.end_time_utc_millis
    }

    /// Program the caller asked to record, if any.
    pub fn program_uri(&self) -> Option<&ProgramUri> {
        self.program_uri.as_ref()
    }

    /// Recorded length; zero while still open.
    pub fn duration_millis(&self) -> i64 {
        self.end_time_utc_millis
            .map_or(0, |end| end - self.start_time_utc_millis)
    }

    /// Midpoint of the closed window, used for program guide lookups.
    pub fn midpoint_utc_millis(&self) -> i64 {
        self.start_time_utc_millis + self.duration_millis() / 2
    }
}
