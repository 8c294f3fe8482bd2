use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::common::PendingMessage;

/// Unbounded FIFO of messages waiting for the sender.
#[derive(Default)]
pub struct OutboundQueue {
    messages: Mutex<VecDeque<PendingMessage>>,
    available: Notify,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: PendingMessage) {
        self.lock().push_back(message);
        self.available.notify_one();
    }

    /// Take the head without waiting.
    pub fn try_pop(&self) -> Option<PendingMessage> {
        self.lock().pop_front()
    }

    /// Wait for the head of the queue.
    ///
    /// Returns `None` once `cancel` fires, even if messages remain.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<PendingMessage> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(message) = self.try_pop() {
                return Some(message);
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = self.available.notified() => {}
            }
        }
    }

    /// Drop everything still queued and return how many messages were lost.
    pub fn clear(&self) -> usize {
        let mut messages = self.lock();
        let dropped = messages.len();
        messages.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
