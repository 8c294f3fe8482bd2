use super::types::SmsPort;

/// Commands the UI sends down to the session runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Queue a text message for `destination` on `port`.
    Send {
        destination: String,
        payload: String,
        port: SmsPort,
    },
    /// Stop both workers and close the transport.
    Stop,
}
