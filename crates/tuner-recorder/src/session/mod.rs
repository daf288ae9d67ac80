mod background;
mod deps;
mod event;
mod facade;
mod sinks;
mod timers;
mod worker;

pub(crate) use {
    background::{BackgroundJob, BackgroundQueue},
    event::SessionEvent,
    timers::{DelayedEvent, DelayedEvents},
    worker::SessionWorker,
};

pub use {
    background::CAPTION_SIDECAR_FILE,
    deps::SessionDeps,
    facade::SessionFacade,
    sinks::{RecorderListener, SourceEventSink},
};
