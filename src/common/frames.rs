use serde::{Deserialize, Serialize};

use super::types::ChatMessage;

/// Frame client gửi lên qua WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    History { friend_id: i64 },
    Message { to: i64, content: String },
}

impl OutboundFrame {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Frame server đẩy xuống, đã phân loại theo kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Message(ChatMessage),
    History(Vec<ChatMessage>),
    Error(String),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TypedFrame {
    Message(ChatMessage),
    History {
        #[serde(default)]
        messages: Vec<ChatMessage>,
    },
}

#[derive(Deserialize)]
struct ErrorFrame {
    error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Typed(TypedFrame),
    Error(ErrorFrame),
}

impl InboundFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let frame = match serde_json::from_str::<RawFrame>(text)? {
            RawFrame::Typed(TypedFrame::Message(message)) => Self::Message(message),
            RawFrame::Typed(TypedFrame::History { messages }) => Self::History(messages),
            RawFrame::Error(ErrorFrame { error }) => Self::Error(error),
        };
        Ok(frame)
    }
}
