use crate::model::{RecordingErrorCode, SessionState};

use std::{panic::Location, path::PathBuf, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording session errors with source location tracking.
///
/// Every variant maps onto one caller-facing [`RecordingErrorCode`] via
/// [`SessionError::code`].
#[derive(Error, Debug)]
pub enum SessionError {
    /// The channel catalog could not resolve the handle.
    #[error("Channel not found: {handle} {location}")]
    ChannelNotFound {
        /// Handle that failed to resolve.
        handle: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The channel forbids recording.
    #[error("Recording prohibited on channel {channel_id} {location}")]
    RecordingProhibited {
        /// Numeric id of the prohibited channel.
        channel_id: u64,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Storage oracle reported insufficient free space.
    #[error("Insufficient storage space {location}")]
    InsufficientSpace {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Tuner hardware stayed busy for every allowed attempt.
    #[error("Tuner busy after {attempts} attempts {location}")]
    TunerBusy {
        /// Total acquisition attempts made.
        attempts: u32,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An event arrived in a state that does not accept it.
    #[error("Event {event} not allowed in state {state:?} {location}")]
    InvalidState {
        /// Name of the rejected event.
        event: &'static str,
        /// State the worker was in.
        state: SessionState,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Creating the recording storage directory failed.
    #[error("Failed to create storage directory {path:?}: {source} {location}")]
    StorageDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The sample recorder failed while preparing.
    #[error("Recorder preparation failed: {source} {location}")]
    RecorderPrepare {
        /// Underlying IO error reported by the recorder.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording ended with less content than the commit threshold.
    #[error("Recording too short: {extracted_micros}us extracted, {minimum_micros}us required {location}")]
    RecordingTooShort {
        /// Content extracted before the recording ended.
        extracted_micros: u64,
        /// Commit threshold.
        minimum_micros: u64,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recorded program store returned no handle.
    #[error("Failed to insert recorded program for {storage_uri} {location}")]
    StoreInsertFailed {
        /// Storage URI of the rejected record.
        storage_uri: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Configuration loading, parsing or validation error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The dedicated worker thread could not be started.
    #[error("Failed to spawn session worker: {reason} {location}")]
    WorkerSpawn {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl SessionError {
    /// The code reported to the session callback for this error.
    pub fn code(&self) -> RecordingErrorCode {
        match self {
            SessionError::TunerBusy { .. } => RecordingErrorCode::ResourceBusy,
            SessionError::InsufficientSpace { .. } => RecordingErrorCode::InsufficientSpace,
            SessionError::ChannelNotFound { .. }
            | SessionError::RecordingProhibited { .. }
            | SessionError::InvalidState { .. }
            | SessionError::StorageDirectory { .. }
            | SessionError::RecorderPrepare { .. }
            | SessionError::RecordingTooShort { .. }
            | SessionError::StoreInsertFailed { .. }
            | SessionError::ConfigError { .. }
            | SessionError::WorkerSpawn { .. }
            | SessionError::Io { .. } => RecordingErrorCode::Unknown,
        }
    }

    #[track_caller]
    pub(crate) fn insufficient_space() -> Self {
        SessionError::InsufficientSpace {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn invalid_state(event: &'static str, state: SessionState) -> Self {
        SessionError::InvalidState {
            event,
            state,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

// Manual From with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<std::io::Error> for SessionError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        SessionError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using [`SessionError`].
pub type Result<T> = StdResult<T, SessionError>;
