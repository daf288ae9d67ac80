use std::fmt;

/// Reference to a program in the program guide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramUri(String);

impl ProgramUri {
    /// Wrap a program guide URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The raw URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Program guide entry attached to a recorded program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramMetadata {
    /// Channel the program airs on.
    pub channel_id: u64,
    /// Program title.
    pub title: Option<String>,
    /// Episode title, for series.
    pub episode_title: Option<String>,
    /// Season number, for series.
    pub season_number: Option<String>,
    /// Episode number, for series.
    pub episode_number: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Scheduled start, UTC milliseconds.
    pub start_time_utc_millis: Option<i64>,
    /// Scheduled end, UTC milliseconds.
    pub end_time_utc_millis: Option<i64>,
}
