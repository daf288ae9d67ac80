//! Single-threaded actor owning one recording session.
//!
//! All session state is touched only from [`SessionWorker::run`]. Facade
//! calls and collaborator callbacks arrive as [`SessionEvent`]s on one
//! ordered queue; retries, recorder polls and storage checks are
//! [`DelayedEvent`] deadlines owned by the worker and cleared on every
//! transition that makes them meaningless.
//!
//! A stopped recording stays owned by the worker until the recorder reports
//! completion. Meanwhile the session publishes `Tuned` and holds `Tune` and
//! `StartRecording` back, replaying them once the recording is committed or
//! discarded.

use crate::{
    RecorderListener, SampleRecorder, SessionCallback, SessionConfig, SessionDeps, SessionError,
    SourceEventSink, TunerSource,
    error::Result as SessionResult,
    model::{
        CaptionTrack, Channel, ChannelHandle, ProgramMetadata, ProgramUri, RecordedProgramRecord,
        RecordingErrorCode, RecordingWindow, SessionState,
    },
    session::{BackgroundJob, BackgroundQueue, DelayedEvent, DelayedEvents, SessionEvent},
};

use std::{
    collections::VecDeque,
    fs,
    panic::Location,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::Utc;
use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const RECORDING_DIR_PREFIX: &str = "recording-";

/// Channels shared between the worker and its facade.
pub(crate) struct WorkerLinks {
    pub(crate) events_tx: mpsc::UnboundedSender<SessionEvent>,
    pub(crate) releasing: Arc<AtomicBool>,
    pub(crate) state_tx: watch::Sender<SessionState>,
    pub(crate) terminated_tx: watch::Sender<bool>,
}

/// A tune waiting for its next attempt.
struct PendingTune {
    channel: ChannelHandle,
    attempt: u32,
}

/// Recording in progress, not yet committed.
struct ActiveRecording {
    ticket: u64,
    /// `None` once released; the completion callback is still outstanding.
    recorder: Option<Box<dyn SampleRecorder>>,
    running: bool,
    window: RecordingWindow,
    bytes_written: u64,
    stopped_at_utc_millis: Option<i64>,
    /// Stopped by request; waiting for the recorder's completion to commit.
    stopping: bool,
}

impl ActiveRecording {
    fn stop_recorder(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            self.bytes_written = recorder.bytes_written();
            recorder.release();
        }
        self.running = false;
        self.stopped_at_utc_millis.get_or_insert_with(now_utc_millis);
    }
}

pub(crate) struct SessionWorker {
    session_id: Uuid,
    deps: SessionDeps,
    callback: Arc<dyn SessionCallback>,
    config: SessionConfig,
    links: WorkerLinks,
    background: BackgroundQueue,
    timers: DelayedEvents,
    state: SessionState,
    channel: Option<Channel>,
    pending_tune: Option<PendingTune>,
    source: Option<Box<dyn TunerSource>>,
    source_ticket: u64,
    recording: Option<ActiveRecording>,
    caption_tracks: Vec<CaptionTrack>,
    /// Commands that arrived while a stopped recording awaited its commit.
    deferred: VecDeque<SessionEvent>,
    next_ticket: u64,
}

impl SessionWorker {
    /// Must be called from inside the runtime that will drive [`run`](Self::run).
    pub(crate) fn new(
        session_id: Uuid,
        deps: SessionDeps,
        callback: Arc<dyn SessionCallback>,
        config: SessionConfig,
        links: WorkerLinks,
    ) -> Self {
        let background = BackgroundQueue::spawn(config.background_queue_capacity);

        Self {
            session_id,
            deps,
            callback,
            config,
            links,
            background,
            timers: DelayedEvents::default(),
            state: SessionState::Idle,
            channel: None,
            pending_tune: None,
            source: None,
            source_ticket: 0,
            recording: None,
            caption_tracks: Vec::new(),
            deferred: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// Process events until `Release`, then tear down.
    #[instrument(skip_all, fields(session_id = %self.session_id))]
    pub(crate) async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        info!("Recording session worker started");

        loop {
            let deadline = self.timers.next_deadline();

            tokio::select! {
                biased;

                event = events_rx.recv() => match event {
                    Some(SessionEvent::Release) | None => break,
                    Some(event) if self.is_releasing() => {
                        debug!(event = event.name(), "Session releasing, event discarded");
                    }
                    Some(event) => {
                        self.dispatch(event).await;
                        self.replay_deferred().await;
                    }
                },

                _ = sleep_until(deadline) => {
                    if self.is_releasing() {
                        self.timers.cancel_all();
                    } else if let Some(due) = self.timers.take_due(Instant::now()) {
                        self.dispatch_delayed(due).await;
                        self.replay_deferred().await;
                    }
                }
            }
        }

        events_rx.close();
        self.teardown().await;
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let name = event.name();
        debug!(event = name, state = ?self.state, "Dispatching event");

        if self.is_stopping() {
            match event {
                SessionEvent::StopRecording => {
                    debug!("Recording already stopping, stop ignored");
                    return;
                }
                SessionEvent::Tune { .. } | SessionEvent::StartRecording { .. } => {
                    debug!(event = name, "Recording stopping, command deferred until commit");
                    self.deferred.push_back(event);
                    return;
                }
                _ => {}
            }
        }

        let result = match event {
            SessionEvent::Tune { channel } => self.handle_tune(channel, 0),
            SessionEvent::StartRecording { program } => self.handle_start_recording(program),
            SessionEvent::StopRecording => self.handle_stop_recording().await,
            SessionEvent::RecorderReady { ticket } => self.handle_recorder_ready(ticket),
            SessionEvent::RecordingCompleted {
                ticket,
                success,
                last_position_micros,
            } => {
                self.handle_recording_completed(ticket, success, last_position_micros)
                    .await
            }
            SessionEvent::CaptionTracksChanged { ticket, tracks } => {
                self.handle_caption_tracks(ticket, tracks);
                Ok(())
            }
            SessionEvent::Release => Ok(()),
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
    }

    async fn dispatch_delayed(&mut self, event: DelayedEvent) {
        debug!(event = ?event, state = ?self.state, "Delayed event due");

        let result = match event {
            DelayedEvent::TuneRetry => match self.pending_tune.take() {
                Some(pending) => self.handle_tune(pending.channel, pending.attempt),
                None => Ok(()),
            },
            DelayedEvent::RecorderPoll => self.poll_recorder(),
            DelayedEvent::StorageMonitor => self.monitor_storage(),
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
    }

    /// Run commands held back while a stopped recording was committing.
    async fn replay_deferred(&mut self) {
        while !self.is_stopping() && !self.is_releasing() {
            let Some(event) = self.deferred.pop_front() else {
                return;
            };
            debug!(event = event.name(), "Replaying deferred command");
            self.dispatch(event).await;
        }
    }

    /// Report `error`, returning the session to idle first.
    async fn fail(&mut self, error: SessionError) {
        let code = error.code();
        warn!(error = %error, code = %code, "Recording session operation failed");

        self.reset().await;
        self.callback.on_error(code);
    }

    #[instrument(skip(self, channel), fields(channel = %channel))]
    fn handle_tune(&mut self, channel: ChannelHandle, attempt: u32) -> SessionResult<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Tuning) {
            return Err(SessionError::invalid_state("tune", self.state));
        }

        self.timers.cancel(DelayedEvent::TuneRetry);
        self.pending_tune = None;

        if !self.deps.storage.is_sufficient() {
            return Err(SessionError::insufficient_space());
        }

        let resolved =
            self.deps
                .channels
                .resolve(&channel)
                .ok_or_else(|| SessionError::ChannelNotFound {
                    handle: channel.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        if resolved.recording_prohibited {
            return Err(SessionError::RecordingProhibited {
                channel_id: resolved.id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let ticket = self.take_ticket();
        let sink = SourceEventSink::new(ticket, self.links.events_tx.clone());

        match self.deps.tuners.acquire(&resolved, sink) {
            Some(source) => {
                info!(
                    channel_id = resolved.id,
                    source_id = source.source_id(),
                    attempt,
                    "Tuner source acquired"
                );
                self.source = Some(source);
                self.source_ticket = ticket;
                self.channel = Some(resolved);
                self.caption_tracks.clear();
                self.set_state(SessionState::Tuned);
                self.callback.on_tuned(&channel);
                Ok(())
            }
            None if attempt < self.config.max_tuning_retry => {
                warn!(
                    channel_id = resolved.id,
                    attempt,
                    retry_in_ms = self.config.tuning_retry_interval_ms,
                    "Tuner busy, retrying"
                );
                self.channel = Some(resolved);
                self.pending_tune = Some(PendingTune {
                    channel,
                    attempt: attempt + 1,
                });
                self.set_state(SessionState::Tuning);
                self.timers.schedule(
                    DelayedEvent::TuneRetry,
                    self.config.tuning_retry_interval(),
                );
                Ok(())
            }
            None => Err(SessionError::TunerBusy {
                attempts: attempt + 1,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[instrument(skip(self))]
    fn handle_start_recording(&mut self, program: Option<ProgramUri>) -> SessionResult<()> {
        if self.state != SessionState::Tuned {
            return Err(SessionError::invalid_state("start_recording", self.state));
        }

        if !self.deps.storage.is_sufficient() {
            warn!("Insufficient storage, recording not started");
            self.callback
                .on_error(RecordingErrorCode::InsufficientSpace);
            return Ok(());
        }

        if self.source.is_none() {
            return Err(SessionError::invalid_state("start_recording", self.state));
        }

        let storage_dir = self
            .deps
            .storage
            .recording_root_directory()
            .join(format!("{}{}", RECORDING_DIR_PREFIX, Uuid::new_v4()));

        fs::create_dir_all(&storage_dir).map_err(|source| SessionError::StorageDirectory {
            path: storage_dir.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let ticket = self.take_ticket();
        let listener = RecorderListener::new(ticket, self.links.events_tx.clone());
        let Some(source) = self.source.as_deref() else {
            return Err(SessionError::invalid_state("start_recording", self.state));
        };
        let recorder = self.deps.recorders.create(source, &storage_dir, listener);

        info!(storage_dir = ?storage_dir, "Recording started");

        self.recording = Some(ActiveRecording {
            ticket,
            recorder: Some(recorder),
            running: false,
            window: RecordingWindow::open(storage_dir, now_utc_millis(), program),
            bytes_written: 0,
            stopped_at_utc_millis: None,
            stopping: false,
        });
        self.set_state(SessionState::Recording);
        self.timers.schedule(
            DelayedEvent::StorageMonitor,
            self.config.storage_monitor_interval(),
        );

        self.poll_recorder()
    }

    /// Check recorder readiness; start it when ready, otherwise poll again.
    fn poll_recorder(&mut self) -> SessionResult<()> {
        let Some(recording) = self.recording.as_mut() else {
            return Ok(());
        };
        if recording.running {
            return Ok(());
        }
        let Some(recorder) = recording.recorder.as_mut() else {
            return Ok(());
        };

        match recorder.prepare() {
            Ok(true) => {
                recorder.start();
                recording.running = true;
                self.timers.cancel(DelayedEvent::RecorderPoll);
                info!(ticket = recording.ticket, "Recorder running");
                Ok(())
            }
            Ok(false) => {
                self.timers.schedule(
                    DelayedEvent::RecorderPoll,
                    self.config.recorder_prepare_poll(),
                );
                Ok(())
            }
            Err(source) => Err(SessionError::RecorderPrepare {
                source,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn handle_recorder_ready(&mut self, ticket: u64) -> SessionResult<()> {
        if self.current_recording_ticket() != Some(ticket) {
            debug!(ticket, "Readiness from stale recorder ignored");
            return Ok(());
        }
        self.poll_recorder()
    }

    fn monitor_storage(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Recording {
            return Ok(());
        }

        if self.deps.storage.is_sufficient() {
            self.timers.schedule(
                DelayedEvent::StorageMonitor,
                self.config.storage_monitor_interval(),
            );
            return Ok(());
        }

        warn!("Storage became insufficient while recording, aborting");
        Err(SessionError::insufficient_space())
    }

    #[instrument(skip(self))]
    async fn handle_stop_recording(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Recording {
            return Err(SessionError::invalid_state("stop_recording", self.state));
        }

        self.timers.cancel(DelayedEvent::StorageMonitor);
        self.timers.cancel(DelayedEvent::RecorderPoll);

        let Some(recording) = self.recording.as_mut() else {
            return Err(SessionError::invalid_state("stop_recording", self.state));
        };

        if recording.running {
            // The recorder reports completion once it has flushed.
            recording.stop_recorder();
            recording.stopping = true;
            info!(ticket = recording.ticket, "Recorder stopped, awaiting completion");
            self.set_state(SessionState::Tuned);
            Ok(())
        } else if recording.recorder.is_some() {
            recording.stop_recorder();
            info!("Recording stopped before the recorder became ready");
            self.finish_recording(false, Some(0)).await
        } else {
            debug!("Recorder already stopped, awaiting completion");
            Ok(())
        }
    }

    async fn handle_recording_completed(
        &mut self,
        ticket: u64,
        success: bool,
        last_position_micros: Option<u64>,
    ) -> SessionResult<()> {
        if self.current_recording_ticket() != Some(ticket) {
            debug!(ticket, "Completion from stale recorder ignored");
            return Ok(());
        }

        self.timers.cancel(DelayedEvent::StorageMonitor);
        self.timers.cancel(DelayedEvent::RecorderPoll);

        if let Some(recording) = self.recording.as_mut()
            && recording.recorder.is_some()
        {
            info!("Recorder terminated on its own");
            recording.stop_recorder();
        }

        self.finish_recording(success, last_position_micros).await
    }

    /// Commit the current recording, or discard it when it is too short.
    ///
    /// A storage directory only survives when a store row points at it.
    #[instrument(skip(self))]
    async fn finish_recording(
        &mut self,
        success: bool,
        last_position_micros: Option<u64>,
    ) -> SessionResult<()> {
        let Some(mut recording) = self.recording.take() else {
            return Ok(());
        };

        let start = recording.window.start_time_utc_millis();
        let (extracted_micros, end) = match last_position_micros {
            Some(position) => (position, start + millis_from_micros(position)),
            None => {
                let end = recording
                    .stopped_at_utc_millis
                    .unwrap_or_else(now_utc_millis);
                let elapsed_millis = u64::try_from(end - start).unwrap_or(0);
                (elapsed_millis.saturating_mul(1_000), end)
            }
        };
        recording.window.close(end);
        let storage_dir = recording.window.storage_dir().to_path_buf();

        let minimum_micros = self.config.min_partial_recording_duration_micros();
        if extracted_micros < minimum_micros {
            info!(
                extracted_micros,
                minimum_micros,
                storage_dir = ?storage_dir,
                "Recording below minimum duration, discarding"
            );
            self.discard_directory(storage_dir).await;
            return Err(SessionError::RecordingTooShort {
                extracted_micros,
                minimum_micros,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(
            duration_ms = recording.window.duration_millis(),
            "Recording finished {}",
            if success { "completely" } else { "partially" }
        );

        let Some(channel_id) = self.channel.as_ref().map(|channel| channel.id) else {
            self.discard_directory(storage_dir).await;
            return Err(SessionError::invalid_state("recording_completed", self.state));
        };

        let program = self.lookup_program(channel_id, &recording.window);
        let record = RecordedProgramRecord::from_window(
            &self.deps.input_id,
            channel_id,
            &recording.window,
            recording.bytes_written,
            program,
        );

        let Some(handle) = self.deps.store.insert(&record) else {
            error!(storage_uri = %record.storage_uri, "Inserting recorded program failed");
            self.discard_directory(storage_dir).await;
            return Err(SessionError::StoreInsertFailed {
                storage_uri: record.storage_uri,
                location: ErrorLocation::from(Location::caller()),
            });
        };

        if !self.caption_tracks.is_empty() {
            self.background
                .submit(BackgroundJob::WriteCaptionSidecar {
                    dir: storage_dir,
                    tracks: self.caption_tracks.clone(),
                })
                .await;
        }

        info!(
            recording = %handle,
            duration_ms = record.duration_millis,
            size_bytes = record.size_bytes,
            "Recording committed"
        );

        self.reset().await;
        self.callback.on_record_finished(&handle);

        Ok(())
    }

    /// Explicit program first, then whatever airs at the window midpoint.
    fn lookup_program(&self, channel_id: u64, window: &RecordingWindow) -> Option<ProgramMetadata> {
        let programs = &self.deps.programs;

        window
            .program_uri()
            .and_then(|uri| {
                let program = programs.program(uri);
                if program.is_none() {
                    debug!(program = %uri, "Requested program not in guide");
                }
                program
            })
            .or_else(|| {
                let midpoint = window.midpoint_utc_millis();
                programs.query_overlapping(channel_id, midpoint, midpoint)
            })
    }

    fn handle_caption_tracks(&mut self, ticket: u64, tracks: Vec<CaptionTrack>) {
        if self.source.is_none() || ticket != self.source_ticket {
            debug!(ticket, "Caption tracks from stale source ignored");
            return;
        }
        debug!(count = tracks.len(), "Caption tracks updated");
        self.caption_tracks = tracks;
    }

    /// Back to idle: cancel delayed events, drop any uncommitted recording,
    /// return the tuner.
    async fn reset(&mut self) {
        self.timers.cancel_all();
        self.pending_tune = None;

        if let Some(mut recording) = self.recording.take() {
            recording.stop_recorder();
            warn!(
                storage_dir = ?recording.window.storage_dir(),
                "Discarding uncommitted recording"
            );
            self.discard_directory(recording.window.storage_dir().to_path_buf())
                .await;
        }

        if let Some(source) = self.source.take() {
            debug!(source_id = source.source_id(), "Releasing tuner source");
            self.deps.tuners.release(source);
        }

        self.channel = None;
        self.caption_tracks.clear();
        self.set_state(SessionState::Idle);
    }

    async fn teardown(mut self) {
        self.reset().await;
        self.background.shutdown().await;
        let _ = self.links.terminated_tx.send(true);
        info!("Recording session worker stopped");
    }

    async fn discard_directory(&mut self, dir: PathBuf) {
        self.background
            .submit(BackgroundJob::DeleteDirectory(dir))
            .await;
    }

    fn is_stopping(&self) -> bool {
        self.recording
            .as_ref()
            .is_some_and(|recording| recording.stopping)
    }

    fn current_recording_ticket(&self) -> Option<u64> {
        self.recording.as_ref().map(|recording| recording.ticket)
    }

    fn take_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Session state changed");
        }
        self.state = state;
        self.links.state_tx.send_replace(state);
    }

    fn is_releasing(&self) -> bool {
        self.links.releasing.load(Ordering::Acquire)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_utc_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_from_micros(micros: u64) -> i64 {
    i64::try_from(micros / 1_000).unwrap_or(i64::MAX)
}
