use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Port used by the demo when nothing else is configured.
pub const DEFAULT_APP_PORT: u16 = 3590;

/// Routing channel of an SMS message.
///
/// The textual form follows the device convention: `"0"` routes to the
/// default inbox, any other number is an app-specific port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SmsPort {
    Inbox,
    App(u16),
}

impl SmsPort {
    pub fn from_number(port: u16) -> Self {
        if port == 0 {
            Self::Inbox
        } else {
            Self::App(port)
        }
    }

    pub fn number(self) -> u16 {
        match self {
            Self::Inbox => 0,
            Self::App(port) => port,
        }
    }
}

impl Default for SmsPort {
    fn default() -> Self {
        Self::App(DEFAULT_APP_PORT)
    }
}

impl fmt::Display for SmsPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid SMS port `{0}`: expected a number between 0 and 65535")]
pub struct PortParseError(pub String);

impl FromStr for SmsPort {
    type Err = PortParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u16>()
            .map(Self::from_number)
            .map_err(|_| PortParseError(value.to_string()))
    }
}

impl TryFrom<String> for SmsPort {
    type Error = PortParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SmsPort> for String {
    fn from(port: SmsPort) -> Self {
        port.to_string()
    }
}

/// An outbound message waiting in the send queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub id: Uuid,
    pub destination: String,
    pub payload: String,
    pub port: SmsPort,
}

impl PendingMessage {
    pub fn new(destination: impl Into<String>, payload: impl Into<String>, port: SmsPort) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination: destination.into(),
            payload: payload.into(),
            port,
        }
    }

    /// Connector-style address: `sms://<addr>` for the inbox,
    /// `sms://<addr>:<port>` for an app channel.
    pub fn address_url(&self) -> String {
        address_url(&self.destination, self.port)
    }
}

pub fn address_url(address: &str, port: SmsPort) -> String {
    match port {
        SmsPort::Inbox => format!("sms://{address}"),
        SmsPort::App(port) => format!("sms://{address}:{port}"),
    }
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub source: String,
    pub payload: String,
    pub port: SmsPort,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(source: impl Into<String>, payload: impl Into<String>, port: SmsPort) -> Self {
        Self {
            source: source.into(),
            payload: payload.into(),
            port,
            received_at: Utc::now(),
        }
    }

    /// Status block shown to the user for a received message.
    pub fn status_text(&self) -> String {
        format!(
            "Received:\nDestination:{}\nData:{}\n",
            self.source, self.payload
        )
    }
}
