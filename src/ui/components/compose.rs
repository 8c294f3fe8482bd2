use eframe::egui;

use crate::ui::state::{AppState, MAX_PHONE_NUMBER_LENGTH, filter_phone_input};

/// Destination and message fields. Returns true when the user asked to send.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> bool {
    let mut send = false;

    egui::Grid::new("compose_grid")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Destination:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut state.destination_input)
                    .char_limit(MAX_PHONE_NUMBER_LENGTH)
                    .hint_text("phone number"),
            );
            if response.changed() {
                state.destination_input = filter_phone_input(&state.destination_input);
            }
            ui.end_row();

            ui.label("Port:");
            ui.add(
                egui::TextEdit::singleline(&mut state.port_input)
                    .char_limit(5)
                    .desired_width(60.0)
                    .hint_text("0 = inbox"),
            );
            ui.end_row();

            ui.label("Message:");
            let response = ui.text_edit_singleline(&mut state.message_input);
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send = true;
            }
            ui.end_row();
        });

    let enabled = state.is_session_alive();
    if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
        send = true;
    }

    send && enabled
}
