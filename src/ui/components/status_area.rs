use eframe::egui;

use crate::ui::state::StatusLog;

pub fn render(ui: &mut egui::Ui, status: &StatusLog) {
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if status.is_empty() {
                ui.label(egui::RichText::new("No activity yet").weak());
            }
            for line in status.lines() {
                ui.label(egui::RichText::new(line).monospace());
            }
        });
}
