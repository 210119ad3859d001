use super::frames::InboundFrame;
use super::types::{
    ChannelId, Credential, Friend, FriendAction, FriendRequest, SessionId, UserProfile,
    UserSummary,
};

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    LoggedIn(Credential),
    LoginFailed(String),
    SignedUp,
    SignupFailed(String),
    /// Kết quả của một lệnh đã xác thực, gắn với phiên phát hành nó.
    Session {
        session: SessionId,
        outcome: SessionOutcome,
    },
    Channel {
        channel: ChannelId,
        event: ChannelEvent,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    ProfileLoaded(UserProfile),
    FriendsLoaded(Vec<Friend>),
    FriendsUnavailable,
    IncomingLoaded(Vec<FriendRequest>),
    IncomingUnavailable,
    RequestResolved {
        sender_id: i64,
        action: FriendAction,
    },
    FriendRemoved {
        friend_id: i64,
    },
    SearchResults(Vec<UserSummary>),
    FriendRequestSent {
        receiver_id: i64,
        message: String,
    },
    FriendRequestCancelled {
        receiver_id: i64,
        message: String,
    },
    /// Friend action thất bại; hiện thông báo, giữ nguyên trạng thái cũ.
    ActionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Failed(String),
    Frame(InboundFrame),
    Error(String),
    Closed,
}
