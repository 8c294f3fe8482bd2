use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{PendingMessage, SmsPort};

use super::events::EventSink;
use super::queue::OutboundQueue;
use super::transport::Transport;
use super::{listener, sender};

/// One send/receive session over a shared transport.
///
/// Owns the transport, the outbound queue and both worker tasks. Everything
/// lives between [`Session::start`] and [`Session::stop`]. `port` is the
/// channel the listener accepts; each queued message carries its own port.
pub struct Session<T: Transport> {
    transport: Arc<T>,
    queue: Arc<OutboundQueue>,
    port: SmsPort,
    cancel: CancellationToken,
    sender_failed: CancellationToken,
    events: EventSink,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Transport> Session<T> {
    /// Spawn the sender and the listener on the current tokio runtime.
    pub fn start(transport: T, port: SmsPort, events: EventSink) -> Self {
        let transport = Arc::new(transport);
        let queue = Arc::new(OutboundQueue::new());
        let cancel = CancellationToken::new();
        let sender_failed = CancellationToken::new();

        let sender = tokio::spawn(sender::run(
            Arc::clone(&transport),
            Arc::clone(&queue),
            cancel.clone(),
            sender_failed.clone(),
            events.clone(),
        ));
        let listener = tokio::spawn(listener::run(
            Arc::clone(&transport),
            port,
            cancel.clone(),
            events.clone(),
        ));

        log::info!("Session started on port {port}");
        Self {
            transport,
            queue,
            port,
            cancel,
            sender_failed,
            events,
            workers: vec![sender, listener],
        }
    }

    /// Queue a message for `destination` on `port`. The outcome is only
    /// reported through session events.
    ///
    /// Messages are dropped with a status line once the session is stopped or
    /// its sender has failed.
    pub fn enqueue(
        &self,
        destination: impl Into<String>,
        payload: impl Into<String>,
        port: SmsPort,
    ) {
        if self.cancel.is_cancelled() {
            log::warn!("Session is stopped; message not queued");
            self.events.status("Session is stopped; message not queued");
            return;
        }
        if self.sender_failed.is_cancelled() {
            log::warn!("Sender has failed; message not queued");
            self.events.status("Sender has failed; message not queued");
            return;
        }

        let message = PendingMessage::new(destination, payload, port);
        log::debug!("Queued {} for {}", message.id, message.address_url());
        self.queue.push(message);

        // The sender may have failed between the check and the push.
        if self.sender_failed.is_cancelled() && self.queue.clear() > 0 {
            self.events.status("Sender has failed; message not queued");
        }
    }

    /// Cancel both workers, drop queued messages, close the transport and
    /// wait for the workers to exit. Calling it twice is harmless.
    pub async fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.cancel.cancel();
        let dropped = self.queue.clear();
        if dropped > 0 {
            log::warn!("Dropped {dropped} queued message(s) on stop");
        }
        self.transport.close();

        for result in futures::future::join_all(self.workers.drain(..)).await {
            if let Err(err) = result {
                log::error!("Session worker panicked: {err}");
            }
        }
        log::info!("Session stopped");
    }

    /// False once the session is stopped or its sender has failed.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.sender_failed.is_cancelled()
    }

    pub fn port(&self) -> SmsPort {
        self.port
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.cancel.cancel();
            self.transport.close();
        }
    }
}
