use crate::{
    SessionError,
    config::{
        DEFAULT_BACKGROUND_QUEUE_CAPACITY, DEFAULT_MAX_TUNING_RETRY,
        DEFAULT_MIN_PARTIAL_RECORDING_DURATION_MS, DEFAULT_RECORDER_PREPARE_POLL_MS,
        DEFAULT_STORAGE_MONITOR_INTERVAL_MS, DEFAULT_TUNING_RETRY_INTERVAL_MS,
        default_background_queue_capacity, default_max_tuning_retry,
        default_min_partial_recording_duration_ms, default_recorder_prepare_poll_ms,
        default_storage_monitor_interval_ms, default_tuning_retry_interval_ms,
    },
    error::Result as SessionResult,
};

use std::{
    fmt, fs,
    io::Write,
    panic::Location,
    path::Path,
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const CONFIG_FILE_NAME: &str = "session.toml";

/// Timing and capacity parameters of a recording session.
///
/// Every field has a default, so a partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed delay between tuner acquisition attempts.
    #[serde(default = "default_tuning_retry_interval_ms")]
    pub tuning_retry_interval_ms: u64,

    /// Retries after the first failed acquisition before reporting busy.
    #[serde(default = "default_max_tuning_retry")]
    pub max_tuning_retry: u32,

    /// Interval at which an unready recorder is polled again.
    #[serde(default = "default_recorder_prepare_poll_ms")]
    pub recorder_prepare_poll_ms: u64,

    /// Interval of the free-space check while recording.
    #[serde(default = "default_storage_monitor_interval_ms")]
    pub storage_monitor_interval_ms: u64,

    /// Recordings with less extracted content than this are discarded.
    #[serde(default = "default_min_partial_recording_duration_ms")]
    pub min_partial_recording_duration_ms: u64,

    /// Bound of the background task queue (directory deletes, sidecars).
    #[serde(default = "default_background_queue_capacity")]
    pub background_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tuning_retry_interval_ms: DEFAULT_TUNING_RETRY_INTERVAL_MS,
            max_tuning_retry: DEFAULT_MAX_TUNING_RETRY,
            recorder_prepare_poll_ms: DEFAULT_RECORDER_PREPARE_POLL_MS,
            storage_monitor_interval_ms: DEFAULT_STORAGE_MONITOR_INTERVAL_MS,
            min_partial_recording_duration_ms: DEFAULT_MIN_PARTIAL_RECORDING_DURATION_MS,
            background_queue_capacity: DEFAULT_BACKGROUND_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Load from the platform config directory, writing defaults if absent.
    #[track_caller]
    #[instrument]
    pub fn load() -> SessionResult<Self> {
        let dirs = ProjectDirs::from("org", "tuner-recorder", "TunerRecorder")
            .ok_or_else(|| config_error("locate config directory", "no home directory"))?;

        Self::load_or_create(&dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load `path`, or write and return the defaults when it does not exist.
    #[track_caller]
    #[instrument]
    pub fn load_or_create(path: &Path) -> SessionResult<Self> {
        if path.exists() {
            return Self::load_from(path);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let config = Self::default();
        config.save_to(path)?;
        info!(config_path = ?path, "Wrote default session config");

        Ok(config)
    }

    /// Load and validate a TOML file.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> SessionResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| config_error("read session config", e))?;
        let config = Self::from_toml_str(&contents)?;

        debug!(config_path = ?path, ?config, "Session config loaded");

        Ok(config)
    }

    /// Parse and validate TOML text.
    #[track_caller]
    pub fn from_toml_str(contents: &str) -> SessionResult<Self> {
        let config: SessionConfig =
            toml::from_str(contents).map_err(|e| config_error("parse session config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write to `path` through a sibling staging file, so readers never see
    /// a partial config.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> SessionResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| config_error("serialize session config", e))?;
        let staging = path.with_extension("toml.tmp");

        let mut file =
            fs::File::create(&staging).map_err(|e| config_error("create staging file", e))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| config_error("write staging file", e))?;
        drop(file);

        fs::rename(&staging, path).map_err(|e| config_error("replace session config", e))?;

        debug!(config_path = ?path, "Session config saved");

        Ok(())
    }

    /// Reject zero intervals and a zero-capacity queue.
    #[track_caller]
    pub fn validate(&self) -> SessionResult<()> {
        let zero_field = [
            ("tuning_retry_interval_ms", self.tuning_retry_interval_ms),
            ("recorder_prepare_poll_ms", self.recorder_prepare_poll_ms),
            ("storage_monitor_interval_ms", self.storage_monitor_interval_ms),
            (
                "background_queue_capacity",
                self.background_queue_capacity as u64,
            ),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);

        match zero_field {
            Some((name, _)) => Err(config_error(name, "must be greater than zero")),
            None => Ok(()),
        }
    }

    /// Delay between tuning attempts.
    pub fn tuning_retry_interval(&self) -> Duration {
        Duration::from_millis(self.tuning_retry_interval_ms)
    }

    /// Recorder readiness poll interval.
    pub fn recorder_prepare_poll(&self) -> Duration {
        Duration::from_millis(self.recorder_prepare_poll_ms)
    }

    /// Storage monitor interval.
    pub fn storage_monitor_interval(&self) -> Duration {
        Duration::from_millis(self.storage_monitor_interval_ms)
    }

    /// Commit threshold in microseconds of extracted content.
    pub fn min_partial_recording_duration_micros(&self) -> u64 {
        self.min_partial_recording_duration_ms.saturating_mul(1_000)
    }
}

#[track_caller]
fn config_error(context: &str, cause: impl fmt::Display) -> SessionError {
    SessionError::ConfigError {
        reason: format!("{}: {}", context, cause),
        location: ErrorLocation::from(Location::caller()),
    }
}
