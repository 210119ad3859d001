use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Số thứ tự của một kết nối WebSocket; tăng dần mỗi lần mở kênh mới.
pub type ChannelId = u64;

/// Số thứ tự của một phiên đăng nhập; tăng mỗi lần đăng nhập hoặc đăng xuất.
pub type SessionId = u64;

/// Bearer token cấp bởi server khi đăng nhập.
///
/// Nội dung là opaque: client không tự kiểm tra, chỉ server quyết định hợp lệ.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Friend {
    pub friend_id: i64,
    pub friend_username: String,
}

/// Lời mời kết bạn đang chờ; `friend_id` là người gửi.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FriendRequest {
    pub id: i64,
    pub friend_id: i64,
    pub friend_username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendAction {
    Accept,
    Reject,
}

impl FriendAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }

    /// Past tense for notices ("Friend request accepted").
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Reject => "rejected",
        }
    }
}

/// Hồ sơ của chính người dùng (`GET /users/me`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_online: bool,
}

/// Một dòng kết quả tìm kiếm người dùng.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_online: bool,
}

/// Domain model đại diện một tin nhắn chat.
///
/// Frame chuyển tiếp cho người nhận không có trường `to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub from: i64,
    #[serde(default)]
    pub to: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// Parse the server timestamp. Accepts RFC 3339 and offset-less ISO 8601
    /// (the latter is taken as UTC).
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn display_time(&self) -> Option<String> {
        self.sent_at().map(|at| {
            at.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
    }
}
