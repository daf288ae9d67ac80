use serde::{Deserialize, Serialize};

/// Closed caption track announced by the tuner source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Caption service number within the stream.
    pub service_number: u32,
    /// ISO 639 language code, when the stream announces one.
    #[serde(default)]
    pub language: Option<String>,
    /// Track uses digital (708) captions rather than line 21.
    #[serde(default)]
    pub digital: bool,
    /// Track is formatted for easy reading.
    #[serde(default)]
    pub easy_reader: bool,
}
