use eframe::egui;

use crate::ui::update::Action;

pub fn render(ui: &mut egui::Ui, draft: &str, actions: &mut Vec<Action>) {
    let mut text = draft.to_string();
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.text_edit_singleline(&mut text);
        if response.changed() {
            actions.push(Action::EditDraft(text.clone()));
        }
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
        }
    });

    if send && !text.trim().is_empty() {
        actions.push(Action::SendDraft);
    }
}
