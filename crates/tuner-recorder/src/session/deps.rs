use crate::{
    ChannelCatalog, ProgramCatalog, RecordedProgramStore, SampleRecorderFactory,
    StorageSufficiencyOracle, TunerSourceManager,
};

use std::sync::Arc;

/// Collaborators a recording session calls into.
#[derive(Clone)]
pub struct SessionDeps {
    /// TV input id stamped on every recorded program.
    pub input_id: String,
    /// Channel handle resolution.
    pub channels: Arc<dyn ChannelCatalog>,
    /// Free-space policy and recording root.
    pub storage: Arc<dyn StorageSufficiencyOracle>,
    /// Tuner hardware arbitration.
    pub tuners: Arc<dyn TunerSourceManager>,
    /// Builds one recorder per recording.
    pub recorders: Arc<dyn SampleRecorderFactory>,
    /// Program guide.
    pub programs: Arc<dyn ProgramCatalog>,
    /// Recorded program persistence.
    pub store: Arc<dyn RecordedProgramStore>,
}
