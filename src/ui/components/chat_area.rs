use eframe::egui;

use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let Some(peer) = &state.peer else {
        ui.label(egui::RichText::new("Select a friend to start chatting").weak());
        return;
    };

    ui.heading(format!("Chat with {}", peer.friend_username));
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in &state.messages {
                let sender = if state.is_own_message(message) {
                    "You".to_string()
                } else {
                    format!("User {}", message.from)
                };

                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(sender).strong());
                    ui.label(&message.content);
                    if let Some(time) = message.display_time() {
                        ui.label(egui::RichText::new(time).weak().small());
                    }
                });
            }
        });
}
