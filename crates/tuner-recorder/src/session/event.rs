use crate::model::{CaptionTrack, ChannelHandle, ProgramUri};

/// Messages processed, in order, by the session worker.
///
/// `ticket` fields identify the tuner source or recorder that produced a
/// callback, so callbacks from torn-down collaborators can be dropped.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Tune {
        channel: ChannelHandle,
    },
    StartRecording {
        program: Option<ProgramUri>,
    },
    StopRecording,
    Release,
    RecorderReady {
        ticket: u64,
    },
    RecordingCompleted {
        ticket: u64,
        success: bool,
        last_position_micros: Option<u64>,
    },
    CaptionTracksChanged {
        ticket: u64,
        tracks: Vec<CaptionTrack>,
    },
}

impl SessionEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SessionEvent::Tune { .. } => "tune",
            SessionEvent::StartRecording { .. } => "start_recording",
            SessionEvent::StopRecording => "stop_recording",
            SessionEvent::Release => "release",
            SessionEvent::RecorderReady { .. } => "recorder_ready",
            SessionEvent::RecordingCompleted { .. } => "recording_completed",
            SessionEvent::CaptionTracksChanged { .. } => "caption_tracks_changed",
        }
    }
}
