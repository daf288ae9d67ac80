//! Narrow interfaces to the components a recording session consumes.
//!
//! All collaborators are called from the session's worker thread only; the
//! sinks they are handed ([`SourceEventSink`](crate::SourceEventSink),
//! [`RecorderListener`](crate::RecorderListener)) may be used from any thread.

mod callback;
mod catalog;
mod recorder;
mod storage;
mod tuner;

pub use {
    callback::SessionCallback,
    catalog::{ChannelCatalog, ProgramCatalog},
    recorder::{SampleRecorder, SampleRecorderFactory},
    storage::{RecordedProgramStore, StorageSufficiencyOracle},
    tuner::{TunerSource, TunerSourceManager},
};
