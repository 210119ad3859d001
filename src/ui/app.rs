use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{Credential, NetworkCommand, NetworkEvent};
use crate::storage::SessionStore;

use super::components::{auth_form, chat_area, input_bar, notice, sidebar, status_bar, user_search};
use super::state::AppState;
use super::update::{self, Action, Effect, SessionEffect};

pub struct ChatApp {
    state: AppState,
    session_store: SessionStore,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session_store: SessionStore,
        stored: Option<Credential>,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self::with_parts(session_store, stored, command_sender, event_receiver)
    }

    fn with_parts(
        session_store: SessionStore,
        stored: Option<Credential>,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        let mut app = Self {
            state: AppState::default(),
            session_store,
            command_sender,
            event_receiver,
        };
        app.dispatch(Action::Boot { stored });
        app
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.dispatch(Action::Network(event));
        }
    }

    fn dispatch(&mut self, action: Action) {
        let transition = update::update(std::mem::take(&mut self.state), action);
        self.state = transition.state;
        for effect in transition.effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Session(SessionEffect::Store(credential)) => {
                if let Err(err) = self.session_store.set(&credential) {
                    log::error!("Failed to persist session: {err}");
                }
            }
            Effect::Session(SessionEffect::Clear) => {
                if let Err(err) = self.session_store.clear() {
                    log::error!("Failed to clear stored session: {err}");
                }
            }
            Effect::Network(command) => self.send_command(command),
        }
    }

    fn send_command(&mut self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    fn render(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        if let Some(current) = self.state.current_notice() {
            notice::render(ctx, current, actions);
        }

        if !self.state.is_authenticated() {
            egui::CentralPanel::default().show(ctx, |ui| {
                auth_form::render(ui, &self.state.auth, actions);
            });
            return;
        }

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            status_bar::render(ui, &self.state, actions);
        });

        egui::SidePanel::left("friend_sidebar").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                sidebar::render(ui, &self.state, actions);
                ui.add_space(12.0);
                user_search::render(ui, &self.state, actions);
            });
        });

        if self.state.peer.is_some() {
            egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
                input_bar::render(ui, &self.state.draft, actions);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &self.state);
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        let mut actions = Vec::new();
        self.render(ctx, &mut actions);
        for action in actions {
            self.dispatch(action);
        }

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::state::ChannelStatus;

    struct Harness {
        app: ChatApp,
        commands: mpsc::Receiver<NetworkCommand>,
        events: mpsc::Sender<NetworkEvent>,
    }

    fn harness(store: SessionStore) -> Harness {
        let stored = store.load().unwrap();
        let (command_sender, commands) = mpsc::channel(100);
        let (events, event_receiver) = mpsc::channel(100);
        Harness {
            app: ChatApp::with_parts(store, stored, command_sender, event_receiver),
            commands,
            events,
        }
    }

    fn drain(commands: &mut mpsc::Receiver<NetworkCommand>) -> Vec<NetworkCommand> {
        std::iter::from_fn(|| commands.try_recv().ok()).collect()
    }

    #[test]
    fn boot_without_stored_session_stays_logged_out() {
        let mut harness = harness(SessionStore::in_memory().unwrap());
        assert!(!harness.app.state.is_authenticated());
        assert!(drain(&mut harness.commands).is_empty());
    }

    #[test]
    fn boot_with_stored_session_fetches_and_connects() {
        let store = SessionStore::in_memory().unwrap();
        store.set(&Credential::new("saved")).unwrap();

        let mut harness = harness(store);
        assert!(harness.app.state.is_authenticated());

        let commands = drain(&mut harness.commands);
        assert_eq!(commands.len(), 4);
        assert!(commands.contains(&NetworkCommand::OpenSocket {
            channel: 1,
            credential: Credential::new("saved"),
        }));
    }

    #[test]
    fn login_event_persists_credential() {
        let mut harness = harness(SessionStore::in_memory().unwrap());
        harness
            .events
            .try_send(NetworkEvent::LoggedIn(Credential::new("fresh")))
            .unwrap();

        harness.app.handle_network_events();

        assert_eq!(
            harness.app.session_store.load().unwrap(),
            Some(Credential::new("fresh"))
        );
        assert_eq!(harness.app.state.channel, ChannelStatus::Connecting(1));
    }

    #[test]
    fn logout_clears_stored_credential() {
        let store = SessionStore::in_memory().unwrap();
        store.set(&Credential::new("saved")).unwrap();
        let mut harness = harness(store);
        drain(&mut harness.commands);

        harness.app.dispatch(Action::Logout);

        assert_eq!(harness.app.session_store.load().unwrap(), None);
        assert_eq!(
            drain(&mut harness.commands),
            vec![NetworkCommand::CloseSocket]
        );
    }
}
