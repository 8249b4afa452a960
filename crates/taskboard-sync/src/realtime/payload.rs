use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use taskboard_core::{BoardError, BoardResult};
use taskboard_domain::UserId;
use uuid::Uuid;

pub type ConversationId = Uuid;
pub type MessageId = Uuid;

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, the set browsers leave
/// alone when encoding a URI component.
const CONTENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(conversation_id: ConversationId, sender_id: UserId, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RealtimeEvent {
    Message(ChatMessage),
    ReactionAdded(Reaction),
    ReactionRemoved(Reaction),
}

impl RealtimeEvent {
    pub fn message_id(&self) -> MessageId {
        match self {
            RealtimeEvent::Message(m) => m.id,
            RealtimeEvent::ReactionAdded(r) | RealtimeEvent::ReactionRemoved(r) => r.message_id,
        }
    }
}

pub fn encode_event(event: &RealtimeEvent) -> BoardResult<String> {
    let wire = match event {
        RealtimeEvent::Message(message) => {
            let mut message = message.clone();
            message.content =
                utf8_percent_encode(&message.content, CONTENT_ENCODE_SET).to_string();
            RealtimeEvent::Message(message)
        }
        other => other.clone(),
    };
    serde_json::to_string(&wire).map_err(|e| BoardError::Serialization(e.to_string()))
}

pub fn encode_message(message: &ChatMessage) -> BoardResult<String> {
    encode_event(&RealtimeEvent::Message(message.clone()))
}

/// Parse a payload received on a topic and decode its message content.
pub fn decode_event(payload: &str) -> BoardResult<RealtimeEvent> {
    let mut event: RealtimeEvent =
        serde_json::from_str(payload).map_err(|e| BoardError::Serialization(e.to_string()))?;
    if let RealtimeEvent::Message(message) = &mut event {
        message.content = percent_decode_str(&message.content)
            .decode_utf8()
            .map_err(|e| BoardError::Serialization(format!("message content: {}", e)))?
            .into_owned();
    }
    Ok(event)
}
