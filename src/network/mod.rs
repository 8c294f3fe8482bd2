pub mod client;
pub mod codec;
pub mod events;
pub mod listener;
pub mod memory;
pub mod queue;
pub mod sender;
pub mod session;
pub mod transport;
pub mod udp;

pub use client::{SmsClient, last_status};
pub use events::EventSink;
pub use memory::MemoryTransport;
pub use queue::OutboundQueue;
pub use session::Session;
pub use transport::{Transport, TransportError};
pub use udp::UdpTransport;
