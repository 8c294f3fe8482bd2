use std::error::Error;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::time::{Duration, interval};
use tokio_util::sync::CancellationToken;

use crate::network::codec::{MAX_PACKET_SIZE, SmsDatagram, swap_endpoints};

use super::dump::hex_dump;

/// Echoes every SMS datagram back to its sender with source and destination
/// swapped. Port-bound messages come back on the port they were sent from.
pub struct LoopbackRelay {
    socket: UdpSocket,
    relayed: u64,
    rejected: u64,
}

impl LoopbackRelay {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        log::info!("Relay listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            relayed: 0,
            rejected: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn relayed_count(&self) -> u64 {
        self.relayed
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), Box<dyn Error>> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let mut stats_interval = interval(Duration::from_secs(30));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buffer) => {
                    let (length, peer) = received?;
                    self.handle_datagram(&mut buffer[..length], peer).await;
                }
                _ = stats_interval.tick() => {
                    log::info!("Statistics: {} relayed, {} rejected", self.relayed, self.rejected);
                }
            }
        }

        Ok(())
    }

    async fn handle_datagram(&mut self, data: &mut [u8], peer: SocketAddr) {
        let datagram = match SmsDatagram::decode(data) {
            Ok(datagram) => datagram,
            Err(err) => {
                self.rejected += 1;
                log::warn!("Rejected {} byte datagram from {peer}: {err}", data.len());
                return;
            }
        };

        log::info!(
            "Received\nSource:{}\nDest:{}\nData[{}]:{}",
            datagram.source,
            datagram.destination,
            data.len(),
            datagram.payload
        );
        log::debug!("Raw message:\n{}", hex_dump(data));

        if let Err(err) = swap_endpoints(data) {
            self.rejected += 1;
            log::warn!("Cannot swap endpoints of datagram from {peer}: {err}");
            return;
        }

        log::debug!("Sending:\n{}", hex_dump(data));
        match self.socket.send_to(data, peer).await {
            Ok(_) => self.relayed += 1,
            Err(err) => log::error!("Failed to return datagram to {peer}: {err}"),
        }
    }
}
