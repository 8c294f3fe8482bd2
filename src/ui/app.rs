use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{SessionCommand, SessionEvent, SmsPort};

use super::components::{compose, session_panel, status_area};
use super::state::AppState;

pub struct SmsApp {
    state: AppState,
    command_sender: mpsc::Sender<SessionCommand>,
    event_receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SmsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<SessionCommand>,
        event_receiver: mpsc::UnboundedReceiver<SessionEvent>,
        default_port: SmsPort,
    ) -> Self {
        Self {
            state: AppState::with_port(default_port),
            command_sender,
            event_receiver,
        }
    }

    fn handle_session_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply(event);
        }
    }

    fn send_message(&mut self) {
        let Some((destination, payload, port)) = self.state.take_send_request() else {
            return;
        };

        if let Err(err) = self.command_sender.try_send(SessionCommand::Send {
            destination,
            payload,
            port,
        }) {
            log::warn!("Failed to hand message to the session: {err}");
            self.state.status.push(&format!("Message not queued: {err}"));
        }
    }
}

impl eframe::App for SmsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_session_events();

        egui::SidePanel::right("session_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                session_panel::render(ui, &self.state);
            });

        egui::TopBottomPanel::top("compose_panel").show(ctx, |ui| {
            ui.heading("SMS Demo");
            ui.separator();
            if compose::render(ui, &mut self.state) {
                self.send_message();
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            status_area::render(ui, &self.state.status);
        });

        ctx.request_repaint();
    }
}
