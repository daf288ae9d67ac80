//! Tuner Recorder
//!
//! Drives one broadcast tuner channel from tune through record to commit.
//! A [`SessionFacade`] forwards requests to a single-threaded worker that
//! owns the session state machine, retries contended tuner hardware, watches
//! free storage while recording and commits finished recordings to the
//! recorded program store.
//!
//! # Example
//!
//! ```no_run
//! use tuner_recorder::{
//!     ChannelHandle, CoreResult, SessionCallback, SessionConfig, SessionDeps, SessionFacade,
//! };
//!
//! use std::sync::Arc;
//!
//! fn record(deps: SessionDeps, callback: Arc<dyn SessionCallback>) -> CoreResult<()> {
//!     let session = SessionFacade::spawn(deps, callback, SessionConfig::load()?)?;
//!
//!     session.tune(ChannelHandle::new("content://tv/channel/7"));
//!     // ... after on_tuned:
//!     session.start_recording(None);
//!     // ... later:
//!     session.stop_recording();
//!     // ... after on_record_finished or on_error:
//!     session.release();
//!     Ok(())
//! }
//! ```

mod collaborators;
mod config;
mod error;
mod model;
mod session;

pub use {
    collaborators::{
        ChannelCatalog, ProgramCatalog, RecordedProgramStore, SampleRecorder,
        SampleRecorderFactory, SessionCallback, StorageSufficiencyOracle, TunerSource,
        TunerSourceManager,
    },
    config::SessionConfig,
    error::{Result as CoreResult, SessionError},
    model::{
        CaptionTrack, Channel, ChannelHandle, ProgramMetadata, ProgramUri, RecordedProgramHandle,
        RecordedProgramRecord, RecordingErrorCode, RecordingWindow, SessionState,
    },
    session::{
        CAPTION_SIDECAR_FILE, RecorderListener, SessionDeps, SessionFacade, SourceEventSink,
    },
};
