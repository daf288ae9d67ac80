//! Handles through which collaborators report back to the worker.
//!
//! Both are cheap to clone and may be used from any thread. Sends after the
//! session terminated are dropped.

use crate::{model::CaptionTrack, session::SessionEvent};

use tokio::sync::mpsc;
use tracing::debug;

/// Stream events from a tuner source.
#[derive(Debug, Clone)]
pub struct SourceEventSink {
    ticket: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SourceEventSink {
    pub(crate) fn new(ticket: u64, events_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { ticket, events_tx }
    }

    /// The stream now announces these caption tracks.
    pub fn caption_tracks_changed(&self, tracks: Vec<CaptionTrack>) {
        let event = SessionEvent::CaptionTracksChanged {
            ticket: self.ticket,
            tracks,
        };
        if self.events_tx.send(event).is_err() {
            debug!(ticket = self.ticket, "Session gone, caption update dropped");
        }
    }
}

/// Readiness and completion reports from a sample recorder.
#[derive(Debug, Clone)]
pub struct RecorderListener {
    ticket: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl RecorderListener {
    pub(crate) fn new(ticket: u64, events_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { ticket, events_tx }
    }

    /// The recorder became ready; the worker re-checks `prepare` immediately
    /// instead of waiting for the next poll.
    pub fn notify_ready(&self) {
        self.send(SessionEvent::RecorderReady {
            ticket: self.ticket,
        });
    }

    /// Recording ended. `last_position_micros` is the extracted content
    /// length, or `None` when the recorder cannot tell.
    pub fn on_completion(&self, success: bool, last_position_micros: Option<u64>) {
        self.send(SessionEvent::RecordingCompleted {
            ticket: self.ticket,
            success,
            last_position_micros,
        });
    }

    fn send(&self, event: SessionEvent) {
        let name = event.name();
        if self.events_tx.send(event).is_err() {
            debug!(ticket = self.ticket, event = name, "Session gone, recorder event dropped");
        }
    }
}
