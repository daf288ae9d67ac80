use std::fmt;

/// Error codes reported through [`SessionCallback::on_error`](crate::SessionCallback::on_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingErrorCode {
    /// Tuner hardware stayed contended for every tuning retry.
    ResourceBusy,
    /// Not enough free storage, either before or during recording.
    InsufficientSpace,
    /// Any other failure: wrong-state event, IO error, store insert failure.
    Unknown,
}

impl fmt::Display for RecordingErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingErrorCode::ResourceBusy => "RESOURCE_BUSY",
            RecordingErrorCode::InsufficientSpace => "INSUFFICIENT_SPACE",
            RecordingErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}
