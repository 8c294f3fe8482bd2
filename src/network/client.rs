use std::error::Error;

use tokio::sync::mpsc;

use crate::common::{SessionCommand, SessionEvent, Worker, WorkerState};
use crate::config::AppConfig;

use super::events::EventSink;
use super::memory::MemoryTransport;
use super::session::Session;
use super::transport::Transport;
use super::udp::UdpTransport;

/// Bridges UI commands to a [`Session`] running on the tokio runtime.
pub struct SmsClient {
    events: EventSink,
    command_receiver: mpsc::Receiver<SessionCommand>,
    config: AppConfig,
}

impl SmsClient {
    pub fn new(
        events: EventSink,
        command_receiver: mpsc::Receiver<SessionCommand>,
        config: AppConfig,
    ) -> Self {
        Self {
            events,
            command_receiver,
            config,
        }
    }

    /// Open the configured transport and serve commands until `Stop` or
    /// until every command sender is dropped.
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        if self.config.offline {
            log::info!("Offline mode: messages loop back in-process");
            self.serve(MemoryTransport::loopback()).await;
            return Ok(());
        }

        let transport = match UdpTransport::open(
            self.config.bind_addr.as_str(),
            self.config.relay_addr.as_str(),
            self.config.local_address.clone(),
            self.config.port,
        )
        .await
        {
            Ok(transport) => transport,
            Err(err) => {
                self.events
                    .status(format!("Failed to open connection: {err}"));
                self.events.state(Worker::Sender, WorkerState::Error);
                self.events.state(Worker::Listener, WorkerState::Error);
                return Err(err.into());
            }
        };

        self.serve(transport).await;
        Ok(())
    }

    pub async fn serve<T: Transport>(mut self, transport: T) {
        let mut session = Session::start(transport, self.config.port, self.events.clone());
        self.events.status(format!(
            "Listening as {} on port {}",
            self.config.local_address, self.config.port
        ));

        while let Some(command) = self.command_receiver.recv().await {
            match command {
                SessionCommand::Send {
                    destination,
                    payload,
                    port,
                } => session.enqueue(destination, payload, port),
                SessionCommand::Stop => break,
            }
        }

        session.stop().await;
    }
}

/// Drain whatever the runner already posted and return its last status line.
///
/// Used once the command channel is closed, to say why the runner quit.
pub fn last_status(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Option<String> {
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Status(text) = event {
            last = Some(text);
        }
    }
    last
}
