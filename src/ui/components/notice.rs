use eframe::egui;

use crate::ui::state::{Notice, NoticeLevel};
use crate::ui::update::Action;

/// Hộp thoại cho thông báo đầu hàng đợi.
pub fn render(ctx: &egui::Context, notice: &Notice, actions: &mut Vec<Action>) {
    let (title, color) = match notice.level {
        NoticeLevel::Info => ("Info", ctx.style().visuals.text_color()),
        NoticeLevel::Error => ("Error", egui::Color32::RED),
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.colored_label(color, &notice.text);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                actions.push(Action::DismissNotice);
            }
        });
}
