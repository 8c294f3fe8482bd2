use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sms_session::common::{SessionCommand, SessionEvent, SmsPort, WorkerState};
use sms_session::config::{self, AppConfig};
use sms_session::network::{self, EventSink, SmsClient};
use sms_session::relay::LoopbackRelay;
use sms_session::ui::SmsApp;

#[derive(Parser)]
#[command(
    name = "sms_session",
    version,
    about = "Queued SMS send/receive demo with a loopback relay"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Loop messages back in-process instead of using the relay
    #[arg(long)]
    offline: bool,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the loopback relay that returns every message to its sender
    Relay {
        /// Socket address to bind (defaults to 0.0.0.0:<relay_port>)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Send messages without the UI and exit once all were attempted
    Send {
        /// Destination phone number
        #[arg(long)]
        to: String,
        /// Port to send on: 0 for the inbox, otherwise an application port
        /// (defaults to the configured port)
        #[arg(long)]
        port: Option<SmsPort>,
        /// Messages, sent in order
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Print inbound messages until Ctrl-C
    Listen,
    /// Write the effective configuration (file, environment, flags) to --config
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if cli.offline {
        app_config.offline = true;
    }

    match cli.mode {
        Some(Mode::Relay { bind }) => {
            let addr = bind.unwrap_or_else(|| {
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, app_config.relay_port))
            });
            run_relay(addr).await
        }
        Some(Mode::Send { to, port, messages }) => {
            let port = port.unwrap_or(app_config.port);
            run_send(app_config, to, port, messages).await
        }
        Some(Mode::Listen) => run_listen(app_config).await,
        Some(Mode::InitConfig) => {
            config::save_config(&cli.config, &app_config)?;
            log::info!("Wrote configuration to {}", cli.config);
            Ok(())
        }
        None => run_gui(app_config).await,
    }
}

fn spawn_client(
    app_config: AppConfig,
) -> (
    mpsc::Sender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionEvent>,
    tokio::task::JoinHandle<()>,
) {
    // UI -> session
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // session -> UI
    let (events, event_rx) = EventSink::channel();

    let handle = tokio::spawn(async move {
        let client = SmsClient::new(events, cmd_rx, app_config);
        if let Err(err) = client.run().await {
            log::error!("Session terminated: {err}");
        }
    });

    (cmd_tx, event_rx, handle)
}

async fn run_relay(addr: SocketAddr) -> Result<(), Box<dyn Error>> {
    log::info!("Starting SMS loopback relay...");
    let mut relay = LoopbackRelay::bind(addr).await?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => log::info!("Received shutdown signal, stopping relay..."),
                Err(err) => {
                    log::error!("Unable to listen for shutdown signal: {err}");
                    return;
                }
            }
            shutdown.cancel();
        });
    }

    if let Err(err) = relay.run(shutdown).await {
        log::error!("Relay error: {err}");
    }

    log::info!(
        "Final statistics: {} relayed, {} rejected",
        relay.relayed_count(),
        relay.rejected_count()
    );
    Ok(())
}

async fn run_send(
    app_config: AppConfig,
    to: String,
    port: SmsPort,
    messages: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let (cmd_tx, mut event_rx, client) = spawn_client(app_config);

    let total = messages.len();
    for payload in messages {
        let command = SessionCommand::Send {
            destination: to.clone(),
            payload,
            port,
        };
        if cmd_tx.send(command).await.is_err() {
            // The runner already quit; its last status line says why.
            client.await?;
            let reason = network::last_status(&mut event_rx)
                .unwrap_or_else(|| "session ended before sending".to_string());
            return Err(reason.into());
        }
    }

    let mut attempted = 0;
    while attempted < total {
        match event_rx.recv().await {
            Some(SessionEvent::SendAttempted { id, delivered }) => {
                attempted += 1;
                let outcome = if delivered { "sent" } else { "failed" };
                println!("[{attempted}/{total}] {id} {outcome}");
            }
            Some(SessionEvent::Status(text)) => println!("{text}"),
            Some(SessionEvent::WorkerState {
                state: WorkerState::Error,
                worker,
            }) => {
                log::error!("{worker} failed; giving up");
                break;
            }
            Some(_) => {}
            None => break,
        }
    }

    let _ = cmd_tx.send(SessionCommand::Stop).await;
    client.await?;
    Ok(())
}

async fn run_listen(app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    let (cmd_tx, mut event_rx, client) = spawn_client(app_config);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(SessionEvent::MessageReceived(message)) => {
                    println!(
                        "[{}] {}: {}",
                        message.received_at.format("%H:%M:%S"),
                        message.source,
                        message.payload
                    );
                }
                Some(SessionEvent::Status(text)) => log::info!("{text}"),
                Some(SessionEvent::WorkerState { state: WorkerState::Error, worker }) => {
                    log::error!("{worker} failed; stopping");
                    break;
                }
                Some(_) => {}
                None => break,
            },
            _ = signal::ctrl_c() => {
                log::info!("Received shutdown signal");
                break;
            }
        }
    }

    let _ = cmd_tx.send(SessionCommand::Stop).await;
    client.await?;
    Ok(())
}

async fn run_gui(app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    let default_port = app_config.port;
    let (cmd_tx, event_rx, client) = spawn_client(app_config);

    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);
    let ui_cmd_tx = cmd_tx.clone();

    eframe::run_native(
        "SMS Demo",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("SmsApp should only be initialized once");

            Ok(Box::new(SmsApp::new(
                cc,
                ui_cmd_tx.clone(),
                event_receiver,
                default_port,
            )))
        }),
    )?;

    // Window closed: stop both workers before the runtime goes away.
    let _ = cmd_tx.send(SessionCommand::Stop).await;
    client.await?;
    Ok(())
}
