use eframe::egui;

use crate::common::WorkerState;
use crate::ui::state::AppState;

fn state_color(state: WorkerState) -> egui::Color32 {
    match state {
        WorkerState::Idle => egui::Color32::GRAY,
        WorkerState::Connected => egui::Color32::GREEN,
        WorkerState::Sending | WorkerState::Receiving => egui::Color32::YELLOW,
        WorkerState::Stopped => egui::Color32::LIGHT_GRAY,
        WorkerState::Error => egui::Color32::RED,
    }
}

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Session");
    ui.separator();

    for (label, worker_state) in [
        ("Sender", state.sender_state),
        ("Listener", state.listener_state),
    ] {
        ui.horizontal(|ui| {
            ui.colored_label(state_color(worker_state), "●");
            ui.label(format!("{label}: {worker_state}"));
        });
    }

    ui.separator();
    ui.label(format!("Sent: {}", state.sent_ok));
    if state.sent_failed > 0 {
        ui.colored_label(egui::Color32::RED, format!("Failed: {}", state.sent_failed));
    }

    ui.separator();
    ui.label("Inbox:");
    if state.received.is_empty() {
        ui.label(egui::RichText::new("Nothing received yet").weak());
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for message in state.received.iter().rev() {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(message.received_at.format("%H:%M:%S").to_string())
                        .weak(),
                );
                ui.label(format!("{}: {}", message.source, message.payload));
            });
        }
    });
}
