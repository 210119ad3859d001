use super::frames::OutboundFrame;
use super::types::{ChannelId, Credential, FriendAction, SessionId};

/// Lệnh UI gửi xuống tầng mạng.
///
/// Mỗi lệnh mang đủ dữ liệu để thực thi (token, session) nên worker không
/// cần giữ trạng thái phiên.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCommand {
    Login {
        email: String,
        password: String,
    },
    Signup {
        username: String,
        email: String,
        password: String,
    },
    FetchProfile(Authed),
    FetchFriends(Authed),
    FetchIncomingRequests(Authed),
    RespondToRequest {
        auth: Authed,
        sender_id: i64,
        action: FriendAction,
    },
    RemoveFriend {
        auth: Authed,
        friend_id: i64,
    },
    SearchUsers {
        auth: Authed,
        query: String,
    },
    SendFriendRequest {
        auth: Authed,
        receiver_id: i64,
    },
    CancelFriendRequest {
        auth: Authed,
        receiver_id: i64,
    },
    /// Đóng kênh cũ (nếu có) rồi mở kênh mới.
    OpenSocket {
        channel: ChannelId,
        credential: Credential,
    },
    CloseSocket,
    SendFrame {
        channel: ChannelId,
        frame: OutboundFrame,
    },
}

/// Token của phiên kèm số phiên đã phát hành lệnh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authed {
    pub session: SessionId,
    pub credential: Credential,
}
