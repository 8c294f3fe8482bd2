use std::io;
use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket, lookup_host};
use tokio_util::sync::CancellationToken;

use crate::common::{InboundMessage, PendingMessage, SmsPort};

use super::codec::{MAX_PACKET_SIZE, SmsDatagram};
use super::transport::{Transport, TransportError};

/// Datagram transport talking to the loopback relay.
pub struct UdpTransport {
    socket: UdpSocket,
    relay: SocketAddr,
    local_address: String,
    local_port: SmsPort,
    closed: CancellationToken,
}

impl UdpTransport {
    /// Bind `bind_addr` and route every outbound message through `relay`.
    pub async fn open(
        bind_addr: impl ToSocketAddrs,
        relay: impl ToSocketAddrs,
        local_address: impl Into<String>,
        local_port: SmsPort,
    ) -> io::Result<Self> {
        let relay = lookup_host(relay).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "relay address did not resolve")
        })?;
        let socket = UdpSocket::bind(bind_addr).await?;
        log::info!(
            "UDP transport bound to {} (relay {relay})",
            socket.local_addr()?
        );

        Ok(Self {
            socket,
            relay,
            local_address: local_address.into(),
            local_port,
            closed: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn encode(&self, message: &PendingMessage) -> Result<Vec<u8>, TransportError> {
        let datagram = SmsDatagram {
            source: self.local_address.clone(),
            destination: message.destination.clone(),
            source_port: self.local_port,
            destination_port: message.port,
            payload: message.payload.clone(),
        };
        Ok(datagram.encode()?)
    }
}

impl Transport for UdpTransport {
    async fn send(&self, message: &PendingMessage) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let data = self.encode(message)?;

        tokio::select! {
            _ = self.closed.cancelled() => Err(TransportError::Closed),
            sent = self.socket.send_to(&data, self.relay) => {
                let sent = sent?;
                log::debug!("Sent {sent} byte datagram for {}", message.address_url());
                Ok(())
            }
        }
    }

    async fn receive(&self) -> Result<InboundMessage, TransportError> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        loop {
            let (length, peer) = tokio::select! {
                _ = self.closed.cancelled() => return Err(TransportError::Closed),
                received = self.socket.recv_from(&mut buffer) => received?,
            };

            if peer != self.relay {
                log::debug!("Ignoring {length} byte datagram from unknown peer {peer}");
                continue;
            }

            match SmsDatagram::decode(&buffer[..length]) {
                Ok(datagram) => {
                    return Ok(InboundMessage::new(
                        datagram.source,
                        datagram.payload,
                        datagram.destination_port,
                    ));
                }
                Err(err) => log::warn!("Skipping undecodable datagram from {peer}: {err}"),
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
