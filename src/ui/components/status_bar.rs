use eframe::egui;

use crate::ui::state::{AppState, ChannelStatus};
use crate::ui::update::Action;

pub fn render(ui: &mut egui::Ui, state: &AppState, actions: &mut Vec<Action>) {
    ui.horizontal(|ui| {
        ui.heading("FriendChat");
        if let Some(profile) = &state.profile {
            ui.label(format!("Signed in as {}", profile.username));
        }

        ui.separator();
        match state.channel {
            ChannelStatus::Open(_) => {
                ui.colored_label(egui::Color32::GREEN, "● Connected");
            }
            ChannelStatus::Connecting(_) => {
                ui.colored_label(egui::Color32::YELLOW, "● Connecting...");
            }
            ChannelStatus::Closed => {
                let label = ui.colored_label(egui::Color32::RED, "● Disconnected");
                if let Some(error) = &state.last_channel_error {
                    label.on_hover_text(error);
                }
                if ui.button("Reconnect").clicked() {
                    actions.push(Action::Reconnect);
                }
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Logout").clicked() {
                actions.push(Action::Logout);
            }
        });
    });
}
