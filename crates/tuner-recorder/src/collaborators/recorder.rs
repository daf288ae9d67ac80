use crate::{RecorderListener, TunerSource};

use std::{io, path::Path};

/// Consumes a tuner source and persists its samples to a storage directory.
///
/// Contract with the session worker:
/// - [`prepare`](Self::prepare) is polled until it returns `Ok(true)`; an
///   `Err` is fatal and never retried.
/// - [`start`](Self::start) is called once, after a successful prepare.
/// - [`release`](Self::release) stops writing. A started recorder must then
///   report exactly one completion through its [`RecorderListener`]; it may
///   also report completion earlier on its own (end of stream, write error).
pub trait SampleRecorder: Send {
    /// Check readiness. `Ok(false)` means "not yet, ask again".
    fn prepare(&mut self) -> io::Result<bool>;

    /// Begin writing samples.
    fn start(&mut self);

    /// Stop writing and free resources.
    fn release(&mut self);

    /// Bytes persisted so far.
    fn bytes_written(&self) -> u64;
}

/// Creates one [`SampleRecorder`] per recording.
pub trait SampleRecorderFactory: Send + Sync {
    /// Build a recorder reading `source` and writing into `storage_dir`.
    fn create(
        &self,
        source: &dyn TunerSource,
        storage_dir: &Path,
        listener: RecorderListener,
    ) -> Box<dyn SampleRecorder>;
}
