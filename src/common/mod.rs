pub mod commands;
pub mod events;
pub mod frames;
pub mod types;

pub use commands::{Authed, NetworkCommand};
pub use events::{ChannelEvent, NetworkEvent, SessionOutcome};
pub use frames::{InboundFrame, OutboundFrame};
pub use types::{
    ChannelId, ChatMessage, Credential, Friend, FriendAction, FriendRequest, SessionId,
    UserProfile, UserSummary,
};
