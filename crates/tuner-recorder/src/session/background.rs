//! Bounded queue of filesystem jobs run off the worker thread.
//!
//! Jobs run one at a time on the blocking pool, in submission order.
//! Failures are logged and not retried. Dropping the sender and awaiting
//! [`BackgroundQueue::shutdown`] drains every job already submitted.

use crate::model::CaptionTrack;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

/// Name of the caption sidecar written next to the recorded samples.
pub const CAPTION_SIDECAR_FILE: &str = "caption_tracks.toml";

#[derive(Debug)]
pub(crate) enum BackgroundJob {
    DeleteDirectory(PathBuf),
    WriteCaptionSidecar {
        dir: PathBuf,
        tracks: Vec<CaptionTrack>,
    },
}

#[derive(Serialize)]
struct CaptionSidecar<'a> {
    tracks: &'a [CaptionTrack],
}

impl BackgroundJob {
    fn kind(&self) -> &'static str {
        match self {
            BackgroundJob::DeleteDirectory(_) => "delete_directory",
            BackgroundJob::WriteCaptionSidecar { .. } => "write_caption_sidecar",
        }
    }

    fn path(&self) -> &Path {
        match self {
            BackgroundJob::DeleteDirectory(dir) => dir,
            BackgroundJob::WriteCaptionSidecar { dir, .. } => dir,
        }
    }

    fn run(&self) -> io::Result<()> {
        match self {
            BackgroundJob::DeleteDirectory(dir) => match fs::remove_dir_all(dir) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                result => result,
            },
            BackgroundJob::WriteCaptionSidecar { dir, tracks } => {
                let contents = toml::to_string_pretty(&CaptionSidecar { tracks })
                    .map_err(io::Error::other)?;
                fs::write(dir.join(CAPTION_SIDECAR_FILE), contents)
            }
        }
    }
}

pub(crate) struct BackgroundQueue {
    jobs_tx: mpsc::Sender<BackgroundJob>,
    handle: JoinHandle<()>,
}

impl BackgroundQueue {
    /// Start the queue on the current runtime.
    pub(crate) fn spawn(capacity: usize) -> Self {
        let (jobs_tx, mut jobs_rx) = mpsc::channel::<BackgroundJob>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(job) = jobs_rx.recv().await {
                let kind = job.kind();
                let path = job.path().to_path_buf();

                match tokio::task::spawn_blocking(move || job.run()).await {
                    Ok(Ok(())) => debug!(job = kind, path = ?path, "Background job done"),
                    Ok(Err(e)) => warn!(job = kind, path = ?path, error = %e, "Background job failed"),
                    Err(e) => warn!(job = kind, path = ?path, error = ?e, "Background job panicked"),
                }
            }
        });

        Self { jobs_tx, handle }
    }

    /// Enqueue a job, waiting for room when the queue is full.
    pub(crate) async fn submit(&self, job: BackgroundJob) {
        if let Err(e) = self.jobs_tx.send(job).await {
            warn!(job = e.0.kind(), path = ?e.0.path(), "Background queue closed, job dropped");
        }
    }

    /// Close the queue and wait for every submitted job to finish.
    pub(crate) async fn shutdown(self) {
        drop(self.jobs_tx);

        match self.handle.await {
            Ok(()) => info!("Background queue drained"),
            Err(e) => warn!(error = ?e, "Background queue task panicked"),
        }
    }
}
