use std::future::Future;
use std::io;

use crate::common::{InboundMessage, PendingMessage};

use super::codec::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Codec(#[from] CodecError),
}

impl TransportError {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Bidirectional message channel shared by the sender and the listener.
///
/// `close` must wake any task blocked in `send` or `receive`; those calls then
/// return [`TransportError::Closed`].
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        message: &PendingMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn receive(&self) -> impl Future<Output = Result<InboundMessage, TransportError>> + Send;

    fn close(&self);

    fn is_closed(&self) -> bool;
}
