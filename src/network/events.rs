use tokio::sync::mpsc;

use crate::common::{SessionEvent, Worker, WorkerState};

/// Posts worker events to the UI thread.
///
/// Unbounded so a worker never waits on a UI that is busy drawing.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn emit(&self, event: SessionEvent) {
        if let Err(err) = self.sender.send(event) {
            log::debug!("UI is gone, dropping event: {:?}", err.0);
        }
    }

    pub fn status(&self, text: impl Into<String>) {
        self.emit(SessionEvent::Status(text.into()));
    }

    pub fn state(&self, worker: Worker, state: WorkerState) {
        log::debug!("{worker} -> {state}");
        self.emit(SessionEvent::WorkerState { worker, state });
    }
}
