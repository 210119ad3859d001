use eframe::egui;

use crate::ui::state::AppState;
use crate::ui::update::Action;

pub fn render(ui: &mut egui::Ui, state: &AppState, actions: &mut Vec<Action>) {
    ui.heading("Find people");
    ui.separator();

    ui.horizontal(|ui| {
        let mut query = state.search.query.clone();
        let response = ui.add(
            egui::TextEdit::singleline(&mut query)
                .hint_text("Username")
                .desired_width(140.0),
        );
        if response.changed() {
            actions.push(Action::EditSearch(query));
        }

        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Search").clicked() || submitted {
            actions.push(Action::SubmitSearch);
        }
    });

    if state.search.searched && state.search.results.is_empty() {
        ui.label(egui::RichText::new("No users found").weak());
    }

    let own_id = state.own_user_id();
    for user in &state.search.results {
        if own_id == Some(user.id) {
            continue;
        }

        ui.horizontal(|ui| {
            let dot = if user.is_online {
                egui::Color32::GREEN
            } else {
                egui::Color32::GRAY
            };
            ui.colored_label(dot, "●");
            ui.label(&user.username);

            if state.is_friend(user.id) {
                ui.label(egui::RichText::new("(friend)").weak());
            } else if state.sent_requests.contains(&user.id) {
                if ui.button("Cancel").clicked() {
                    actions.push(Action::CancelFriendRequest {
                        receiver_id: user.id,
                    });
                }
            } else if ui.button("Add").clicked() {
                actions.push(Action::SendFriendRequest {
                    receiver_id: user.id,
                });
            }
        });
    }
}
