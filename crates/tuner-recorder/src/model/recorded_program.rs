use crate::model::{ProgramMetadata, RecordingWindow};

use std::fmt;

/// Handle returned by the recorded program store after a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordedProgramHandle(String);

impl RecordedProgramHandle {
    /// Wrap a store-issued handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordedProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable row describing a committed recording.
///
/// `start_time_utc_millis`, `end_time_utc_millis` and `duration_millis` are
/// the physically recorded bounds. The program's own schedule, when known,
/// lives in `program` and is what [`display_bounds`](Self::display_bounds)
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedProgramRecord {
    /// TV input that produced the recording.
    pub input_id: String,
    /// Channel the recording was made on.
    pub channel_id: u64,
    /// `file://` URI of the storage directory.
    pub storage_uri: String,
    /// Physical length of the recording.
    pub duration_millis: i64,
    /// Bytes written by the recorder.
    pub size_bytes: u64,
    /// Physical start, UTC milliseconds.
    pub start_time_utc_millis: i64,
    /// Physical end, UTC milliseconds.
    pub end_time_utc_millis: i64,
    /// Program guide entry overlapping the recording, if one was found.
    pub program: Option<ProgramMetadata>,
}

impl RecordedProgramRecord {
    /// Build a record from a closed window and optional program metadata.
    pub fn from_window(
        input_id: &str,
        channel_id: u64,
        window: &RecordingWindow,
        size_bytes: u64,
        program: Option<ProgramMetadata>,
    ) -> Self {
        let start = window.start_time_utc_millis();
        let end = window.end_time_utc_millis().unwrap_or(start);
        Self {
            input_id: input_id.to_string(),
            channel_id,
            storage_uri: window.storage_uri(),
            duration_millis: end - start,
            size_bytes,
            start_time_utc_millis: start,
            end_time_utc_millis: end,
            program,
        }
    }

    /// Bounds to show users: the program schedule where known, otherwise the
    /// physical bounds.
    pub fn display_bounds(&self) -> (i64, i64) {
        let program = self.program.as_ref();
        let start = program
            .and_then(|p| p.start_time_utc_millis)
            .unwrap_or(self.start_time_utc_millis);
        let end = program
            .and_then(|p| p.end_time_utc_millis)
            .unwrap_or(self.end_time_utc_millis);
        (start, end)
    }
}
