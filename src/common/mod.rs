pub mod commands;
pub mod events;
pub mod types;

pub use commands::SessionCommand;
pub use events::{SessionEvent, Worker, WorkerState};
pub use types::{InboundMessage, PendingMessage, PortParseError, SmsPort};
