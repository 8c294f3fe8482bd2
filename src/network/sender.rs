use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::common::{SessionEvent, Worker, WorkerState};

use super::events::EventSink;
use super::queue::OutboundQueue;
use super::transport::Transport;

/// Outbound worker: pops the queue head and sends it, one message at a time.
///
/// A message leaves the queue before its send attempt, so a failed send is
/// reported and dropped. When the transport closes underneath the worker,
/// `failed` is cancelled and the queue is emptied before `Error` is reported.
pub async fn run<T: Transport>(
    transport: Arc<T>,
    queue: Arc<OutboundQueue>,
    cancel: CancellationToken,
    failed: CancellationToken,
    events: EventSink,
) {
    events.state(Worker::Sender, WorkerState::Connected);

    let final_state = loop {
        let Some(message) = queue.pop(&cancel).await else {
            break WorkerState::Stopped;
        };

        events.state(Worker::Sender, WorkerState::Sending);
        log::debug!("Sending {} to {}", message.id, message.address_url());

        match transport.send(&message).await {
            Ok(()) => {
                events.emit(SessionEvent::SendAttempted {
                    id: message.id,
                    delivered: true,
                });
            }
            Err(err) if err.is_closed() && cancel.is_cancelled() => {
                log::info!("Send of {} interrupted by stop", message.id);
                events.emit(SessionEvent::SendAttempted {
                    id: message.id,
                    delivered: false,
                });
                break WorkerState::Stopped;
            }
            Err(err) => {
                log::error!("Failed to send {} to {}: {err}", message.id, message.destination);
                events.emit(SessionEvent::SendAttempted {
                    id: message.id,
                    delivered: false,
                });
                events.status(format!("Send to {} failed: {err}", message.destination));
                if err.is_closed() {
                    break WorkerState::Error;
                }
            }
        }

        events.state(Worker::Sender, WorkerState::Connected);
    };

    if final_state == WorkerState::Error {
        failed.cancel();
        let dropped = queue.clear();
        if dropped > 0 {
            log::warn!("Sender is down; dropped {dropped} queued message(s)");
            events.status(format!("Sender stopped; {dropped} queued message(s) dropped"));
        }
    }
    events.state(Worker::Sender, final_state);
}
