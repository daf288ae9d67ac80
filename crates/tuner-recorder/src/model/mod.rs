mod caption_track;
mod channel;
mod error_code;
mod program;
mod recorded_program;
mod recording_window;
mod session_state;

pub use {
    caption_track::CaptionTrack,
    channel::{Channel, ChannelHandle},
    error_code::RecordingErrorCode,
    program::{ProgramMetadata, ProgramUri},
    recorded_program::{RecordedProgramHandle, RecordedProgramRecord},
    recording_window::RecordingWindow,
    session_state::SessionState,
};
