use std::fmt;

/// Opaque reference to a channel, as issued by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle(String);

impl ChannelHandle {
    /// Wrap a caller-supplied handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel metadata resolved from the channel catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Numeric channel id used by the program guide and the recorded store.
    pub id: u64,
    /// Handle the channel was resolved from.
    pub handle: ChannelHandle,
    /// Name shown to users, used only for logging here.
    pub display_name: String,
    /// Broadcaster forbids recording this channel.
    pub recording_prohibited: bool,
}
