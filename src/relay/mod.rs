pub mod dump;
pub mod server;

pub use dump::hex_dump;
pub use server::LoopbackRelay;
