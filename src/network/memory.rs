use std::sync::{Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::common::{InboundMessage, PendingMessage};

use super::transport::{Transport, TransportError};

/// In-process transport.
///
/// Records every delivered message, can echo deliveries back as inbound
/// messages (like the loopback relay does) and can hold sends behind a gate.
pub struct MemoryTransport {
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: AsyncMutex<mpsc::UnboundedReceiver<InboundMessage>>,
    sent: Mutex<Vec<PendingMessage>>,
    send_gate: watch::Sender<bool>,
    echo: bool,
    closed: CancellationToken,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (send_gate, _) = watch::channel(true);
        Self {
            inbound_tx,
            inbound_rx: AsyncMutex::new(inbound_rx),
            sent: Mutex::new(Vec::new()),
            send_gate,
            echo: false,
            closed: CancellationToken::new(),
        }
    }

    /// Every delivered message comes back as an inbound message from its
    /// destination.
    pub fn loopback() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Queue a message for the next `receive` call.
    pub fn inject(&self, message: InboundMessage) {
        if self.inbound_tx.send(message).is_err() {
            log::debug!("Inbound queue dropped; transport is gone");
        }
    }

    /// Messages delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<PendingMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent().len()
    }

    /// Hold subsequent sends until [`MemoryTransport::open_gate`].
    pub fn close_gate(&self) {
        self.send_gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.send_gate.send_replace(true);
    }

    fn record(&self, message: &PendingMessage) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    async fn send(&self, message: &PendingMessage) -> Result<(), TransportError> {
        let mut gate = self.send_gate.subscribe();
        tokio::select! {
            _ = self.closed.cancelled() => return Err(TransportError::Closed),
            opened = async { gate.wait_for(|open| *open).await.is_ok() } => {
                if !opened {
                    return Err(TransportError::Closed);
                }
            }
        }

        // A close that raced with the gate opening still wins.
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }

        self.record(message);
        log::debug!("Delivered {} to {}", message.id, message.address_url());

        if self.echo {
            self.inject(InboundMessage::new(
                message.destination.clone(),
                message.payload.clone(),
                message.port,
            ));
        }
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, TransportError> {
        tokio::select! {
            _ = self.closed.cancelled() => Err(TransportError::Closed),
            message = async { self.inbound_rx.lock().await.recv().await } => {
                message.ok_or(TransportError::Closed)
            }
        }
    }

    fn close(&self) {
        self.closed.cancel();
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}
