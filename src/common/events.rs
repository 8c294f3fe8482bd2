use std::fmt;

use uuid::Uuid;

use super::types::InboundMessage;

/// Background worker owning one direction of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Worker {
    Sender,
    Listener,
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Listener => f.write_str("listener"),
        }
    }
}

/// Lifecycle of a worker.
///
/// `Idle -> Connected -> (Sending | Receiving) -> Connected`, with `Stopped`
/// reachable from anywhere and `Error` terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Connected,
    Sending,
    Receiving,
    Stopped,
    Error,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Error)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Sending => "sending",
            Self::Receiving => "receiving",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Events the session workers post back to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MessageReceived(InboundMessage),
    /// A send attempt finished; `delivered` is false when the transport failed.
    SendAttempted { id: Uuid, delivered: bool },
    WorkerState { worker: Worker, state: WorkerState },
    /// Free-form status line for the status log.
    Status(String),
}
