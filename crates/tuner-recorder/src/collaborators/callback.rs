use crate::model::{ChannelHandle, RecordedProgramHandle, RecordingErrorCode};

/// Receives the asynchronous outcome of facade requests.
///
/// Invoked on the session's worker thread.
pub trait SessionCallback: Send + Sync {
    /// Tuner hardware is bound to the channel.
    fn on_tuned(&self, channel: &ChannelHandle);

    /// A recording was committed to the recorded program store.
    fn on_record_finished(&self, recording: &RecordedProgramHandle);

    /// The current operation failed.
    ///
    /// The session is back to idle, except for `INSUFFICIENT_SPACE` at
    /// recording start, which leaves it tuned.
    fn on_error(&self, code: RecordingErrorCode);
}
