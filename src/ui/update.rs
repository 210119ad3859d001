//! Hàm cập nhật duy nhất của ứng dụng.
//!
//! `update` nhận trạng thái cũ cùng một [`Action`], trả về trạng thái mới và
//! danh sách [`Effect`] cần thực thi. Không có I/O nào xảy ra ở đây.

use crate::common::{
    Authed, ChannelEvent, ChannelId, Credential, Friend, FriendAction, InboundFrame, NetworkCommand,
    NetworkEvent, OutboundFrame, SessionId, SessionOutcome,
};

use super::state::{
    ActiveSession, AppState, AuthField, AuthForm, AuthMode, ChannelStatus, Notice,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Khởi động, kèm credential đã lưu (nếu có).
    Boot { stored: Option<Credential> },
    EditAuthField { field: AuthField, value: String },
    ToggleAuthMode,
    SubmitAuth,
    Logout,
    RefreshLists,
    SelectPeer(Friend),
    RemoveFriend { friend_id: i64 },
    RespondToRequest { sender_id: i64, action: FriendAction },
    EditDraft(String),
    SendDraft,
    EditSearch(String),
    SubmitSearch,
    SendFriendRequest { receiver_id: i64 },
    CancelFriendRequest { receiver_id: i64 },
    Reconnect,
    DismissNotice,
    Network(NetworkEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Session(SessionEffect),
    Network(NetworkCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Store(Credential),
    Clear,
}

#[derive(Debug)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

pub fn update(state: AppState, action: Action) -> Transition {
    let mut step = Step {
        state,
        effects: Vec::new(),
    };
    step.apply(action);
    Transition {
        state: step.state,
        effects: step.effects,
    }
}

struct Step {
    state: AppState,
    effects: Vec<Effect>,
}

impl Step {
    fn apply(&mut self, action: Action) {
        match action {
            Action::Boot { stored } => {
                if let Some(credential) = stored {
                    log::info!("Restoring stored session");
                    self.activate_session(credential);
                }
            }
            Action::EditAuthField { field, value } => {
                *self.state.auth.field_mut(field) = value;
            }
            Action::ToggleAuthMode => {
                let auth = &mut self.state.auth;
                auth.mode = match auth.mode {
                    AuthMode::Login => AuthMode::Signup,
                    AuthMode::Signup => AuthMode::Login,
                };
                auth.error = None;
                auth.clear_inputs();
            }
            Action::SubmitAuth => self.submit_auth(),
            Action::Logout => self.logout(),
            Action::RefreshLists => self.refresh_lists(),
            Action::SelectPeer(friend) => self.select_peer(friend),
            Action::RemoveFriend { friend_id } => {
                self.authed_command(|auth| NetworkCommand::RemoveFriend { auth, friend_id });
            }
            Action::RespondToRequest { sender_id, action } => {
                self.authed_command(|auth| NetworkCommand::RespondToRequest {
                    auth,
                    sender_id,
                    action,
                });
            }
            Action::EditDraft(draft) => self.state.draft = draft,
            Action::SendDraft => self.send_draft(),
            Action::EditSearch(query) => self.state.search.query = query,
            Action::SubmitSearch => {
                let query = self.state.search.query.trim().to_string();
                if !query.is_empty() {
                    self.authed_command(|auth| NetworkCommand::SearchUsers { auth, query });
                }
            }
            Action::SendFriendRequest { receiver_id } => {
                self.authed_command(|auth| NetworkCommand::SendFriendRequest { auth, receiver_id });
            }
            Action::CancelFriendRequest { receiver_id } => {
                self.authed_command(|auth| NetworkCommand::CancelFriendRequest {
                    auth,
                    receiver_id,
                });
            }
            Action::Reconnect => {
                if let Some(session) = self.state.session.clone() {
                    self.open_channel(session.credential);
                }
            }
            Action::DismissNotice => {
                self.state.notices.pop_front();
            }
            Action::Network(event) => self.apply_network(event),
        }
    }

    fn apply_network(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::LoggedIn(credential) => {
                self.effects
                    .push(Effect::Session(SessionEffect::Store(credential.clone())));
                self.activate_session(credential);
            }
            NetworkEvent::LoginFailed(message) | NetworkEvent::SignupFailed(message) => {
                self.state.auth.submitting = false;
                self.state.auth.error = Some(message);
            }
            NetworkEvent::SignedUp => {
                let auth = &mut self.state.auth;
                auth.submitting = false;
                auth.error = None;
                auth.mode = AuthMode::Login;
                auth.clear_inputs();
            }
            NetworkEvent::Session { session, outcome } => {
                if self.is_current_session(session) {
                    self.apply_session_outcome(outcome);
                } else {
                    log::debug!("Dropping result from superseded session {session}");
                }
            }
            NetworkEvent::Channel { channel, event } => {
                if self.state.channel.id() == Some(channel) {
                    self.apply_channel_event(channel, event);
                } else {
                    log::debug!("Dropping event from stale chat channel {channel}");
                }
            }
        }
    }

    fn apply_session_outcome(&mut self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::ProfileLoaded(profile) => self.state.profile = Some(profile),
            SessionOutcome::FriendsLoaded(friends) => self.state.friends = friends,
            SessionOutcome::FriendsUnavailable => self.state.friends.clear(),
            SessionOutcome::IncomingLoaded(requests) => self.state.incoming = requests,
            SessionOutcome::IncomingUnavailable => self.state.incoming.clear(),
            SessionOutcome::RequestResolved { sender_id, action } => {
                self.state
                    .incoming
                    .retain(|request| request.friend_id != sender_id);
                self.notify(Notice::info(format!(
                    "Friend request {}",
                    action.past_tense()
                )));
                self.refresh_lists();
            }
            SessionOutcome::FriendRemoved { friend_id } => {
                // Peer hiện tại được giữ nguyên kể cả khi vừa bị xoá.
                log::debug!("Friend {friend_id} removed");
                self.notify(Notice::info("Friend removed"));
                self.authed_command(NetworkCommand::FetchFriends);
            }
            SessionOutcome::SearchResults(users) => {
                self.state.search.results = users;
                self.state.search.searched = true;
            }
            SessionOutcome::FriendRequestSent {
                receiver_id,
                message,
            } => {
                self.state.sent_requests.insert(receiver_id);
                self.notify(Notice::info(message));
            }
            SessionOutcome::FriendRequestCancelled {
                receiver_id,
                message,
            } => {
                self.state.sent_requests.remove(&receiver_id);
                self.notify(Notice::info(message));
            }
            SessionOutcome::ActionFailed(message) => self.notify(Notice::error(message)),
        }
    }

    fn apply_channel_event(&mut self, channel: ChannelId, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                self.state.channel = ChannelStatus::Open(channel);
                self.state.last_channel_error = None;
                if let Some(friend_id) = self.state.peer.as_ref().map(|peer| peer.friend_id) {
                    self.send_frame(channel, OutboundFrame::History { friend_id });
                }
            }
            ChannelEvent::Failed(reason) => {
                self.state.channel = ChannelStatus::Closed;
                self.state.last_channel_error = Some(reason);
            }
            ChannelEvent::Frame(InboundFrame::Message(message)) => {
                self.state.messages.push(message);
            }
            ChannelEvent::Frame(InboundFrame::History(messages)) => {
                self.state.messages = messages;
            }
            ChannelEvent::Frame(InboundFrame::Error(error)) | ChannelEvent::Error(error) => {
                self.notify(Notice::error(format!("WS Error: {error}")));
            }
            ChannelEvent::Closed => self.state.channel = ChannelStatus::Closed,
        }
    }

    fn submit_auth(&mut self) {
        let auth = &mut self.state.auth;
        auth.error = None;
        auth.submitting = true;
        let command = match auth.mode {
            AuthMode::Login => NetworkCommand::Login {
                email: auth.email.clone(),
                password: auth.password.clone(),
            },
            AuthMode::Signup => NetworkCommand::Signup {
                username: auth.username.clone(),
                email: auth.email.clone(),
                password: auth.password.clone(),
            },
        };
        self.effects.push(Effect::Network(command));
    }

    /// Kích hoạt phiên mới: reset dữ liệu phụ thuộc, tải danh sách, mở kênh.
    fn activate_session(&mut self, credential: Credential) {
        let id = self.state.last_session_id + 1;
        self.reset_session_state();
        self.state.last_session_id = id;
        self.state.session = Some(ActiveSession {
            id,
            credential: credential.clone(),
        });

        self.refresh_lists();
        self.authed_command(NetworkCommand::FetchProfile);
        self.open_channel(credential);
    }

    fn logout(&mut self) {
        self.effects.push(Effect::Session(SessionEffect::Clear));
        if self.state.channel != ChannelStatus::Closed {
            self.effects
                .push(Effect::Network(NetworkCommand::CloseSocket));
        }
        self.reset_session_state();
        log::info!("Logged out");
    }

    /// Xoá credential và mọi trạng thái phụ thuộc; giữ bộ đếm phiên/kênh.
    fn reset_session_state(&mut self) {
        let last_session_id = self.state.last_session_id;
        let last_channel_id = self.state.last_channel_id;
        self.state = AppState {
            auth: AuthForm::default(),
            last_session_id,
            last_channel_id,
            ..AppState::default()
        };
    }

    fn open_channel(&mut self, credential: Credential) {
        let channel = self.state.last_channel_id + 1;
        self.state.last_channel_id = channel;
        self.state.channel = ChannelStatus::Connecting(channel);
        self.effects.push(Effect::Network(NetworkCommand::OpenSocket {
            channel,
            credential,
        }));
    }

    fn select_peer(&mut self, friend: Friend) {
        let friend_id = friend.friend_id;
        self.state.peer = Some(friend);
        self.state.messages.clear();
        // Khi kênh chưa mở, lịch sử được yêu cầu lúc nhận `Opened`.
        if let Some(channel) = self.state.channel.open_id() {
            self.send_frame(channel, OutboundFrame::History { friend_id });
        }
    }

    fn send_draft(&mut self) {
        let Some(to) = self.state.peer.as_ref().map(|peer| peer.friend_id) else {
            return;
        };
        if self.state.draft.trim().is_empty() {
            return;
        }
        let Some(channel) = self.state.channel.open_id() else {
            self.notify(Notice::error("Chat is not connected"));
            return;
        };
        let content = std::mem::take(&mut self.state.draft);
        self.send_frame(channel, OutboundFrame::Message { to, content });
    }

    fn refresh_lists(&mut self) {
        self.authed_command(NetworkCommand::FetchFriends);
        self.authed_command(NetworkCommand::FetchIncomingRequests);
    }

    fn send_frame(&mut self, channel: ChannelId, frame: OutboundFrame) {
        self.effects
            .push(Effect::Network(NetworkCommand::SendFrame { channel, frame }));
    }

    fn authed_command(&mut self, build: impl FnOnce(Authed) -> NetworkCommand) {
        match self.state.authed() {
            Some(auth) => self.effects.push(Effect::Network(build(auth))),
            None => log::debug!("Ignoring authenticated action without a session"),
        }
    }

    fn is_current_session(&self, session: SessionId) -> bool {
        self.state
            .session
            .as_ref()
            .is_some_and(|active| active.id == session)
    }

    fn notify(&mut self, notice: Notice) {
        self.state.notices.push_back(notice);
    }
}
