use std::fmt;

use crossbeam_channel::Sender;
use serde::Serialize;

/// Steps of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    GeneratingReference,
    Aligning,
    Quantitating,
    Exporting,
    Done,
    Cancelled,
    Errored,
}

impl BatchState {
    /// Whether the run has ended in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Done | BatchState::Cancelled | BatchState::Errored)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BatchState::Idle => "idle",
            BatchState::GeneratingReference => "reference generation",
            BatchState::Aligning => "alignment",
            BatchState::Quantitating => "quantitation",
            BatchState::Exporting => "export",
            BatchState::Done => "done",
            BatchState::Cancelled => "cancelled",
            BatchState::Errored => "errored",
        };
        f.write_str(text)
    }
}

/// How serious a [`Notification`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Critical,
}

/// User-facing description of a batch failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub detail: String,
    pub severity: Severity,
}

/// Progress and completion messages of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    StateChanged { state: BatchState },
    /// Percentage of analytes with reference peaks
    ReferenceProgress { percent: u8 },
    /// Percentage of files aligned
    AlignmentProgress { percent: u8 },
    /// Percentage of files quantified
    QuantitationProgress { percent: u8 },
    Finished { success: bool },
    Aborted,
    Error { notification: Notification },
}

/// `round(100·done/total)`
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((100.0 * done as f64 / total as f64).round() as u8).min(100)
}

/// Receiver of batch events
pub trait EventSink {
    fn emit(&mut self, event: BatchEvent);
}

impl EventSink for Sender<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        // Nobody listening is not an error for the batch
        let _ = self.send(event);
    }
}

impl EventSink for Vec<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        self.push(event);
    }
}

/// Adapts a closure into an [`EventSink`]
pub struct CallbackSink<F: FnMut(&BatchEvent)> {
    callback: F,
}

impl<F: FnMut(&BatchEvent)> CallbackSink<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&BatchEvent)> EventSink for CallbackSink<F> {
    fn emit(&mut self, event: BatchEvent) {
        (self.callback)(&event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: BatchEvent) {
        (**self).emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(2, 5), 40);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_sinks() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut sender = sender;
        sender.emit(BatchEvent::Aborted);
        assert_eq!(receiver.try_recv(), Ok(BatchEvent::Aborted));

        let mut seen = 0;
        {
            let mut sink = CallbackSink::new(|_: &BatchEvent| seen += 1);
            sink.emit(BatchEvent::Finished { success: true });
            sink.emit(BatchEvent::Aborted);
        }
        assert_eq!(seen, 2);
    }
}
