use std::time::Duration;

use tokio::time::Instant;

/// Messages the worker posts to itself with a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DelayedEvent {
    TuneRetry,
    RecorderPoll,
    StorageMonitor,
}

impl DelayedEvent {
    const ALL: [DelayedEvent; 3] = [
        DelayedEvent::TuneRetry,
        DelayedEvent::RecorderPoll,
        DelayedEvent::StorageMonitor,
    ];

    fn slot(self) -> usize {
        match self {
            DelayedEvent::TuneRetry => 0,
            DelayedEvent::RecorderPoll => 1,
            DelayedEvent::StorageMonitor => 2,
        }
    }
}

/// At most one pending deadline per [`DelayedEvent`] kind.
///
/// Scheduling a kind that is already pending replaces its deadline.
#[derive(Debug, Default)]
pub(crate) struct DelayedEvents {
    deadlines: [Option<Instant>; 3],
}

impl DelayedEvents {
    pub(crate) fn schedule(&mut self, event: DelayedEvent, delay: Duration) {
        self.deadlines[event.slot()] = Some(Instant::now() + delay);
    }

    pub(crate) fn cancel(&mut self, event: DelayedEvent) {
        self.deadlines[event.slot()] = None;
    }

    pub(crate) fn cancel_all(&mut self) {
        self.deadlines = [None; 3];
    }

    #[cfg(test)]
    pub(crate) fn is_scheduled(&self, event: DelayedEvent) -> bool {
        self.deadlines[event.slot()].is_some()
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().flatten().min().copied()
    }

    /// Remove and return the earliest event whose deadline is at or before `now`.
    pub(crate) fn take_due(&mut self, now: Instant) -> Option<DelayedEvent> {
        let due = DelayedEvent::ALL
            .into_iter()
            .filter_map(|event| self.deadlines[event.slot()].map(|deadline| (deadline, event)))
            .filter(|(deadline, _)| *deadline <= now)
            .min_by_key(|(deadline, _)| *deadline)
            .map(|(_, event)| event)?;

        self.cancel(due);
        Some(due)
    }
}
