use eframe::egui;

use crate::ui::state::{AuthField, AuthForm, AuthMode};
use crate::ui::update::Action;

pub fn render(ui: &mut egui::Ui, form: &AuthForm, actions: &mut Vec<Action>) {
    let (title, submit, toggle) = match form.mode {
        AuthMode::Login => ("Log in", "Log in", "No account? Sign up"),
        AuthMode::Signup => ("Sign up", "Create account", "Have an account? Log in"),
    };

    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading(title);
        ui.add_space(12.0);

        let mut submitted = false;
        if form.mode == AuthMode::Signup {
            submitted |= field(ui, form, AuthField::Username, "Username", false, actions);
        }
        submitted |= field(ui, form, AuthField::Email, "Email", false, actions);
        submitted |= field(ui, form, AuthField::Password, "Password", true, actions);

        if let Some(error) = &form.error {
            ui.colored_label(egui::Color32::RED, error);
        }

        ui.add_space(8.0);
        let clicked = ui
            .add_enabled(!form.submitting, egui::Button::new(submit))
            .clicked();
        if (clicked || submitted) && !form.submitting {
            actions.push(Action::SubmitAuth);
        }

        if ui.link(toggle).clicked() {
            actions.push(Action::ToggleAuthMode);
        }
    });
}

/// Trả về `true` khi người dùng nhấn Enter trong ô.
fn field(
    ui: &mut egui::Ui,
    form: &AuthForm,
    field: AuthField,
    hint: &str,
    password: bool,
    actions: &mut Vec<Action>,
) -> bool {
    let mut value = match field {
        AuthField::Username => form.username.clone(),
        AuthField::Email => form.email.clone(),
        AuthField::Password => form.password.clone(),
    };

    let response = ui.add(
        egui::TextEdit::singleline(&mut value)
            .hint_text(hint)
            .password(password),
    );
    if response.changed() {
        actions.push(Action::EditAuthField { field, value });
    }

    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
}
