//! Publish/subscribe chat over named topics.
//!
//! Each conversation has its own topic; `/topic/messages` carries every new
//! message for inbox-style listeners. Payloads are JSON events whose message
//! `content` travels percent-encoded.

pub mod channel;
pub mod feed;
pub mod payload;

pub use channel::{InProcessChannel, RealtimeChannel};
pub use feed::{send_message, toggle_reaction, ConversationFeed};
pub use payload::{
    decode_event, encode_event, encode_message, ChatMessage, ConversationId, MessageId, Reaction,
    RealtimeEvent,
};

use std::fmt;
use taskboard_core::{BoardError, BoardResult};
use uuid::Uuid;

const CONVERSATION_PREFIX: &str = "/topic/conversations/";
const MESSAGES_TOPIC: &str = "/topic/messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Conversation(ConversationId),
    Messages,
}

impl Topic {
    pub fn path(&self) -> String {
        match self {
            Topic::Conversation(id) => format!("{}{}", CONVERSATION_PREFIX, id),
            Topic::Messages => MESSAGES_TOPIC.to_string(),
        }
    }

    pub fn parse(path: &str) -> BoardResult<Self> {
        if path == MESSAGES_TOPIC {
            return Ok(Topic::Messages);
        }
        path.strip_prefix(CONVERSATION_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(Topic::Conversation)
            .ok_or_else(|| BoardError::validation(format!("Unknown topic: {}", path)))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
