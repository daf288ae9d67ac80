/// State of a recording session worker.
///
/// A tuner source is held exactly when the state is `Tuned` or `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing tuned.
    #[default]
    Idle,
    /// Waiting for tuner hardware to become available.
    Tuning,
    /// Bound to a live tuner source.
    Tuned,
    /// Extracting the tuner stream to storage.
    Recording,
}
