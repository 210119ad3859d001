use std::collections::{BTreeSet, VecDeque};

use crate::common::{
    Authed, ChannelId, ChatMessage, Credential, Friend, FriendRequest, SessionId, UserProfile,
    UserSummary,
};

/// Trạng thái cục bộ của UI.
///
/// Chỉ được thay đổi qua [`super::update::update`]; view đọc và phát action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub session: Option<ActiveSession>,
    pub auth: AuthForm,
    pub profile: Option<UserProfile>,
    pub friends: Vec<Friend>,
    pub incoming: Vec<FriendRequest>,
    /// Người đang chat cùng (peer).
    pub peer: Option<Friend>,
    /// Hội thoại với peer hiện tại, theo thứ tự nhận.
    pub messages: Vec<ChatMessage>,
    pub draft: String,
    pub search: UserSearch,
    /// Người nhận của các lời mời đã gửi trong phiên này.
    pub sent_requests: BTreeSet<i64>,
    pub channel: ChannelStatus,
    pub last_channel_error: Option<String>,
    pub notices: VecDeque<Notice>,
    pub(super) last_session_id: SessionId,
    pub(super) last_channel_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub id: SessionId,
    pub credential: Credential,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl AuthForm {
    pub fn field_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn clear_inputs(&mut self) {
        self.username.clear();
        self.email.clear();
        self.password.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSearch {
    pub query: String,
    pub results: Vec<UserSummary>,
    /// Đã có ít nhất một lần tìm hoàn tất.
    pub searched: bool,
}

/// Góc nhìn của UI về kênh chat. `Connecting` là khoảng giữa lúc phát lệnh
/// mở và lúc worker báo kết quả.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    Closed,
    Connecting(ChannelId),
    Open(ChannelId),
}

impl ChannelStatus {
    pub fn id(self) -> Option<ChannelId> {
        match self {
            Self::Closed => None,
            Self::Connecting(id) | Self::Open(id) => Some(id),
        }
    }

    pub fn open_id(self) -> Option<ChannelId> {
        match self {
            Self::Open(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Thông báo chặn; người dùng phải bấm OK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl AppState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn authed(&self) -> Option<Authed> {
        self.session.as_ref().map(|session| Authed {
            session: session.id,
            credential: session.credential.clone(),
        })
    }

    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn own_user_id(&self) -> Option<i64> {
        self.profile.as_ref().map(|profile| profile.id)
    }

    pub fn is_own_message(&self, message: &ChatMessage) -> bool {
        self.own_user_id() == Some(message.from)
    }

    pub fn is_friend(&self, user_id: i64) -> bool {
        self.friends.iter().any(|friend| friend.friend_id == user_id)
    }
}
