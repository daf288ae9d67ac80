use crate::model::{Channel, ChannelHandle, ProgramMetadata, ProgramUri};

/// Resolves channel handles to channel metadata.
pub trait ChannelCatalog: Send + Sync {
    /// Look up a channel, or `None` when the handle is unknown.
    fn resolve(&self, handle: &ChannelHandle) -> Option<Channel>;
}

/// Read access to the persisted program guide.
pub trait ProgramCatalog: Send + Sync {
    /// Fetch the program a caller explicitly asked to record.
    fn program(&self, uri: &ProgramUri) -> Option<ProgramMetadata>;

    /// First program on `channel_id` airing within `[start, end]` (UTC millis).
    fn query_overlapping(
        &self,
        channel_id: u64,
        start_utc_millis: i64,
        end_utc_millis: i64,
    ) -> Option<ProgramMetadata>;
}
