use eframe::egui;

use crate::common::FriendAction;
use crate::ui::state::AppState;
use crate::ui::update::Action;

pub fn render(ui: &mut egui::Ui, state: &AppState, actions: &mut Vec<Action>) {
    ui.horizontal(|ui| {
        ui.heading("Friends");
        if ui.small_button("⟳").on_hover_text("Reload lists").clicked() {
            actions.push(Action::RefreshLists);
        }
    });
    ui.separator();

    if state.friends.is_empty() {
        ui.label(egui::RichText::new("No friends yet").weak());
    }

    let selected = state.peer.as_ref().map(|peer| peer.friend_id);
    for friend in &state.friends {
        ui.horizontal(|ui| {
            let name = if selected == Some(friend.friend_id) {
                egui::RichText::new(&friend.friend_username).strong()
            } else {
                egui::RichText::new(&friend.friend_username)
            };
            ui.label(name);

            if ui.button("Chat").clicked() {
                actions.push(Action::SelectPeer(friend.clone()));
            }
            if ui.button("Remove").clicked() {
                actions.push(Action::RemoveFriend {
                    friend_id: friend.friend_id,
                });
            }
        });
    }

    ui.add_space(12.0);
    ui.heading("Friend requests");
    ui.separator();

    if state.incoming.is_empty() {
        ui.label(egui::RichText::new("No pending requests").weak());
    }

    for request in &state.incoming {
        ui.horizontal(|ui| {
            ui.label(&request.friend_username);
            for action in [FriendAction::Accept, FriendAction::Reject] {
                let label = match action {
                    FriendAction::Accept => "Accept",
                    FriendAction::Reject => "Reject",
                };
                if ui.button(label).clicked() {
                    actions.push(Action::RespondToRequest {
                        sender_id: request.friend_id,
                        action,
                    });
                }
            }
        });
    }
}
