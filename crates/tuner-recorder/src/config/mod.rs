//! Tunable timing and capacity parameters for recording sessions.

mod session_config;

pub use session_config::SessionConfig;

pub(crate) const DEFAULT_TUNING_RETRY_INTERVAL_MS: u64 = 1_000;
pub(crate) const DEFAULT_MAX_TUNING_RETRY: u32 = 6;
pub(crate) const DEFAULT_RECORDER_PREPARE_POLL_MS: u64 = 50;
pub(crate) const DEFAULT_STORAGE_MONITOR_INTERVAL_MS: u64 = 5_000;
pub(crate) const DEFAULT_MIN_PARTIAL_RECORDING_DURATION_MS: u64 = 10_000;
pub(crate) const DEFAULT_BACKGROUND_QUEUE_CAPACITY: usize = 16;

pub(crate) fn default_tuning_retry_interval_ms() -> u64 {
    DEFAULT_TUNING_RETRY_INTERVAL_MS
}

pub(crate) fn default_max_tuning_retry() -> u32 {
    DEFAULT_MAX_TUNING_RETRY
}

pub(crate) fn default_recorder_prepare_poll_ms() -> u64 {
    DEFAULT_RECORDER_PREPARE_POLL_MS
}

pub(crate) fn default_storage_monitor_interval_ms() -> u64 {
    DEFAULT_STORAGE_MONITOR_INTERVAL_MS
}

pub(crate) fn default_min_partial_recording_duration_ms() -> u64 {
    DEFAULT_MIN_PARTIAL_RECORDING_DURATION_MS
}

pub(crate) fn default_background_queue_capacity() -> usize {
    DEFAULT_BACKGROUND_QUEUE_CAPACITY
}
