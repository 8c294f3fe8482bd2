use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::common::{SessionEvent, SmsPort, Worker, WorkerState};

use super::events::EventSink;
use super::transport::Transport;

/// Inbound worker: blocks on the transport and hands every arrival to the UI.
///
/// Any receive error ends the run. The transport is never reopened here; a
/// stop shows up as `Stopped`, anything else as `Error`.
pub async fn run<T: Transport>(
    transport: Arc<T>,
    port: SmsPort,
    cancel: CancellationToken,
    events: EventSink,
) {
    events.state(Worker::Listener, WorkerState::Connected);

    let final_state = loop {
        if cancel.is_cancelled() {
            break WorkerState::Stopped;
        }

        events.state(Worker::Listener, WorkerState::Receiving);
        let message = tokio::select! {
            _ = cancel.cancelled() => break WorkerState::Stopped,
            received = transport.receive() => received,
        };

        match message {
            Ok(message) if message.port != port => {
                log::debug!(
                    "Dropping message from {} on port {} (listening on {port})",
                    message.source,
                    message.port
                );
            }
            Ok(message) => {
                log::info!("Received message from {}", message.source);
                events.status(message.status_text());
                events.emit(SessionEvent::MessageReceived(message));
            }
            Err(err) if cancel.is_cancelled() => {
                log::debug!("Listener stopped: {err}");
                break WorkerState::Stopped;
            }
            Err(err) => {
                log::error!("Receive failed: {err}");
                events.status(format!("Receive failed: {err}"));
                break WorkerState::Error;
            }
        }

        events.state(Worker::Listener, WorkerState::Connected);
    };

    events.state(Worker::Listener, final_state);
}
