use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::{InboundMessage, SessionEvent, SmsPort, Worker, WorkerState};

pub const MAX_PHONE_NUMBER_LENGTH: usize = 32;
const MAX_STATUS_LINES: usize = 200;
const MAX_RECEIVED_MESSAGES: usize = 200;

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9*#]+$").expect("phone number pattern compiles"));

/// Keep only characters a phone number field accepts, up to the length limit.
pub fn filter_phone_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '*' | '#'))
        .take(MAX_PHONE_NUMBER_LENGTH)
        .collect()
}

pub fn is_valid_phone_number(address: &str) -> bool {
    address.len() <= MAX_PHONE_NUMBER_LENGTH && PHONE_NUMBER.is_match(address)
}

/// Append-only status text, trimmed to the most recent lines.
#[derive(Debug, Default)]
pub struct StatusLog {
    lines: VecDeque<String>,
}

impl StatusLog {
    pub fn push(&mut self, text: &str) {
        for line in text.lines() {
            self.lines.push_back(line.to_string());
        }
        while self.lines.len() > MAX_STATUS_LINES {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// UI-local state. Only ever touched on the UI thread.
pub struct AppState {
    pub destination_input: String,
    pub message_input: String,
    pub port_input: String,
    pub status: StatusLog,
    /// Most recent inbound messages, oldest first.
    pub received: VecDeque<InboundMessage>,
    pub sender_state: WorkerState,
    pub listener_state: WorkerState,
    pub sent_ok: usize,
    pub sent_failed: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_port(SmsPort::default())
    }

    /// Start with `port` prefilled in the compose form.
    pub fn with_port(port: SmsPort) -> Self {
        Self {
            destination_input: String::new(),
            message_input: String::new(),
            port_input: port.to_string(),
            status: StatusLog::default(),
            received: VecDeque::new(),
            sender_state: WorkerState::Idle,
            listener_state: WorkerState::Idle,
            sent_ok: 0,
            sent_failed: 0,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::MessageReceived(message) => {
                self.received.push_back(message);
                while self.received.len() > MAX_RECEIVED_MESSAGES {
                    self.received.pop_front();
                }
            }
            SessionEvent::SendAttempted { delivered, .. } => {
                if delivered {
                    self.sent_ok += 1;
                } else {
                    self.sent_failed += 1;
                }
            }
            SessionEvent::WorkerState { worker, state } => match worker {
                Worker::Sender => self.sender_state = state,
                Worker::Listener => self.listener_state = state,
            },
            SessionEvent::Status(text) => self.status.push(&text),
        }
    }

    /// Validate the compose fields and hand back `(destination, payload, port)`.
    ///
    /// Nothing is sent unless destination and message are filled in. The
    /// message field is cleared on success; destination and port stay for the
    /// next message.
    pub fn take_send_request(&mut self) -> Option<(String, String, SmsPort)> {
        let destination = self.destination_input.trim();
        if destination.is_empty() || self.message_input.is_empty() {
            return None;
        }
        if !is_valid_phone_number(destination) {
            self.status
                .push(&format!("Invalid destination `{destination}`"));
            return None;
        }

        let port = match self.port_input.parse::<SmsPort>() {
            Ok(port) => port,
            Err(err) => {
                self.status.push(&err.to_string());
                return None;
            }
        };

        let destination = destination.to_string();
        let payload = std::mem::take(&mut self.message_input);
        Some((destination, payload, port))
    }

    pub fn is_session_alive(&self) -> bool {
        !self.sender_state.is_terminal()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::common::SmsPort;

    #[test]
    fn phone_filter_strips_and_truncates() {
        assert_eq!(filter_phone_input("+1 (555) 010-0199"), "+15550100199");
        assert_eq!(filter_phone_input(&"9".repeat(40)).len(), MAX_PHONE_NUMBER_LENGTH);
        assert!(is_valid_phone_number("+15550100"));
        assert!(!is_valid_phone_number("555-0100"));
        assert!(!is_valid_phone_number("1+2"));
    }

    #[test]
    fn send_requires_both_fields() {
        let mut state = AppState::new();
        state.message_input = "Hello".to_string();
        assert_eq!(state.take_send_request(), None);

        state.destination_input = "5550002".to_string();
        assert_eq!(
            state.take_send_request(),
            Some(("5550002".to_string(), "Hello".to_string(), SmsPort::App(3590)))
        );
        assert!(state.message_input.is_empty());
        assert_eq!(state.destination_input, "5550002");
        assert_eq!(state.take_send_request(), None);
    }

    #[test]
    fn invalid_destination_is_reported() {
        let mut state = AppState::new();
        state.destination_input = "call me".to_string();
        state.message_input = "Hello".to_string();

        assert_eq!(state.take_send_request(), None);
        assert_eq!(state.message_input, "Hello");
        assert!(state.status.lines().any(|line| line.contains("call me")));
    }

    #[test]
    fn send_uses_the_port_field() {
        let mut state = AppState::with_port(SmsPort::Inbox);
        assert_eq!(state.port_input, "0");
        state.destination_input = "5550002".to_string();
        state.message_input = "to the inbox".to_string();
        assert_eq!(
            state.take_send_request().map(|(_, _, port)| port),
            Some(SmsPort::Inbox)
        );

        state.port_input = "16000".to_string();
        state.message_input = "to an app".to_string();
        assert_eq!(
            state.take_send_request().map(|(_, _, port)| port),
            Some(SmsPort::App(16000))
        );

        state.port_input = "70000".to_string();
        state.message_input = "nowhere".to_string();
        assert_eq!(state.take_send_request(), None);
        assert_eq!(state.message_input, "nowhere");
        assert!(state.status.lines().any(|line| line.contains("70000")));
    }

    #[test]
    fn received_messages_keep_the_most_recent() {
        let mut state = AppState::new();
        for i in 0..250 {
            let message = InboundMessage::new("5550003", format!("msg {i}"), SmsPort::Inbox);
            state.apply(SessionEvent::MessageReceived(message));
        }

        assert_eq!(state.received.len(), MAX_RECEIVED_MESSAGES);
        assert_eq!(state.received.front().unwrap().payload, "msg 50");
        assert_eq!(state.received.back().unwrap().payload, "msg 249");
    }

    #[test]
    fn events_update_state() {
        let mut state = AppState::new();
        let message = InboundMessage::new("5550003", "Hi", SmsPort::Inbox);

        state.apply(SessionEvent::Status(message.status_text()));
        state.apply(SessionEvent::MessageReceived(message));
        state.apply(SessionEvent::SendAttempted {
            id: Uuid::new_v4(),
            delivered: false,
        });
        state.apply(SessionEvent::WorkerState {
            worker: Worker::Listener,
            state: WorkerState::Error,
        });

        assert_eq!(state.received.len(), 1);
        assert_eq!(state.sent_failed, 1);
        assert_eq!(state.listener_state, WorkerState::Error);
        assert_eq!(
            state.status.lines().collect::<Vec<_>>(),
            vec!["Received:", "Destination:5550003", "Data:Hi"]
        );
    }

    #[test]
    fn status_log_keeps_recent_lines() {
        let mut log = StatusLog::default();
        for i in 0..250 {
            log.push(&format!("line {i}"));
        }
        assert_eq!(log.len(), MAX_STATUS_LINES);
        assert_eq!(log.lines().next(), Some("line 50"));
    }
}
