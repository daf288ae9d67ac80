use crate::{SourceEventSink, model::Channel};

/// A live binding to tuner hardware producing a transport stream.
pub trait TunerSource: Send {
    /// Identifier of the hardware binding, for logging.
    fn source_id(&self) -> u64;
}

/// Arbitrates the global pool of tuner hardware.
pub trait TunerSourceManager: Send + Sync {
    /// Bind a tuner to `channel`. Returns `None` while hardware is contended.
    ///
    /// The source reports stream events (caption tracks) through `events`.
    fn acquire(&self, channel: &Channel, events: SourceEventSink) -> Option<Box<dyn TunerSource>>;

    /// Return the hardware. Called exactly once per acquired source.
    fn release(&self, source: Box<dyn TunerSource>);
}
