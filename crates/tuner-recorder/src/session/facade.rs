use crate::{
    SessionCallback, SessionConfig, SessionDeps, SessionError,
    error::Result as SessionResult,
    model::{ChannelHandle, ProgramUri, SessionState},
    session::{SessionEvent, SessionWorker, worker::WorkerLinks},
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Thread-safe front of one recording session.
///
/// Every request is queued to the session worker and returns immediately.
/// Outcomes arrive through the [`SessionCallback`] given at spawn time.
/// Dropping the facade releases the session.
pub struct SessionFacade {
    session_id: Uuid,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    releasing: Arc<AtomicBool>,
    state_rx: watch::Receiver<SessionState>,
    terminated_rx: watch::Receiver<bool>,
}

/// Worker-side ends created alongside a facade.
struct WorkerSeed {
    links: WorkerLinks,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionFacade {
    /// Start a session on its own worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerSpawn`] if the thread cannot be started,
    /// or [`SessionError::ConfigError`] for an invalid config.
    #[track_caller]
    #[instrument(skip(deps, callback))]
    pub fn spawn(
        deps: SessionDeps,
        callback: Arc<dyn SessionCallback>,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        config.validate()?;
        let (facade, seed) = Self::with_seed();
        let session_id = facade.session_id;

        std::thread::Builder::new()
            .name(format!("tuner-session-{}", session_id.simple()))
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(session_id = %session_id, error = ?e, "Failed to create session runtime");
                        return;
                    }
                };

                rt.block_on(async move {
                    let worker = SessionWorker::new(session_id, deps, callback, config, seed.links);
                    worker.run(seed.events_rx).await;
                });
            })
            .map_err(|e| SessionError::WorkerSpawn {
                reason: format!("Failed to spawn worker thread: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(session_id = %session_id, "Recording session spawned");

        Ok(facade)
    }

    /// Start a session as a task on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerSpawn`] when called outside a runtime,
    /// or [`SessionError::ConfigError`] for an invalid config.
    #[track_caller]
    #[instrument(skip(deps, callback))]
    pub fn spawn_in_runtime(
        deps: SessionDeps,
        callback: Arc<dyn SessionCallback>,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        config.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| SessionError::WorkerSpawn {
                reason: format!("No tokio runtime: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (facade, seed) = Self::with_seed();
        let session_id = facade.session_id;

        runtime.spawn(async move {
            let worker = SessionWorker::new(session_id, deps, callback, config, seed.links);
            worker.run(seed.events_rx).await;
        });

        info!(session_id = %session_id, "Recording session spawned on current runtime");

        Ok(facade)
    }

    fn with_seed() -> (Self, WorkerSeed) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let releasing = Arc::new(AtomicBool::new(false));
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (terminated_tx, terminated_rx) = watch::channel(false);

        let facade = Self {
            session_id: Uuid::new_v4(),
            events_tx: events_tx.clone(),
            releasing: Arc::clone(&releasing),
            state_rx,
            terminated_rx,
        };

        let seed = WorkerSeed {
            links: WorkerLinks {
                events_tx,
                releasing,
                state_tx,
                terminated_tx,
            },
            events_rx,
        };

        (facade, seed)
    }

    /// Identifier used to correlate this session's log lines.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Bind tuner hardware to `channel`.
    pub fn tune(&self, channel: ChannelHandle) {
        self.send(SessionEvent::Tune { channel });
    }

    /// Start recording the tuned channel, optionally naming the program.
    pub fn start_recording(&self, program: Option<ProgramUri>) {
        self.send(SessionEvent::StartRecording { program });
    }

    /// Stop recording; the recording is then committed or discarded.
    pub fn stop_recording(&self) {
        self.send(SessionEvent::StopRecording);
    }

    /// Discard pending requests and shut the session down. Idempotent.
    pub fn release(&self) {
        if self.releasing.swap(true, Ordering::AcqRel) {
            debug!(session_id = %self.session_id, "Session already released");
            return;
        }
        info!(session_id = %self.session_id, "Releasing recording session");
        self.send(SessionEvent::Release);
    }

    /// Latest state published by the worker.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Resolves once the worker has stopped and its background jobs drained.
    pub async fn terminated(&self) {
        let mut terminated_rx = self.terminated_rx.clone();
        // An Err means the worker is gone without signalling, which is also terminal.
        let _ = terminated_rx.wait_for(|terminated| *terminated).await;
    }

    fn send(&self, event: SessionEvent) {
        let name = event.name();
        if self.events_tx.send(event).is_err() {
            debug!(session_id = %self.session_id, event = name, "Session terminated, request dropped");
        }
    }
}

impl Drop for SessionFacade {
    fn drop(&mut self) {
        self.release();
    }
}
