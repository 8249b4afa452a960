use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use taskboard_core::BoardResult;
use taskboard_domain::UserId;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;

use super::channel::RealtimeChannel;
use super::payload::{
    decode_event, encode_event, ChatMessage, ConversationId, MessageId, Reaction, RealtimeEvent,
};
use super::Topic;
use crate::scope::TaskScope;

/// Local view of one conversation, built from realtime events.
#[derive(Debug, Clone)]
pub struct ConversationFeed {
    conversation_id: ConversationId,
    messages: Vec<ChatMessage>,
    reactions: HashSet<Reaction>,
}

impl ConversationFeed {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            messages: Vec::new(),
            reactions: HashSet::new(),
        }
    }

    /// Start from messages fetched over the regular API.
    pub fn with_history(conversation_id: ConversationId, history: Vec<ChatMessage>) -> Self {
        let mut feed = Self::new(conversation_id);
        for message in history {
            feed.apply(RealtimeEvent::Message(message));
        }
        feed
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Messages ordered by send time.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns whether the event changed the feed. Redelivered messages,
    /// messages for other conversations and repeated reaction events are
    /// ignored.
    pub fn apply(&mut self, event: RealtimeEvent) -> bool {
        match event {
            RealtimeEvent::Message(message) => {
                if message.conversation_id != self.conversation_id
                    || self.messages.iter().any(|m| m.id == message.id)
                {
                    return false;
                }
                let at = self
                    .messages
                    .partition_point(|m| (m.sent_at, m.id) <= (message.sent_at, message.id));
                self.messages.insert(at, message);
                true
            }
            RealtimeEvent::ReactionAdded(reaction) => self.reactions.insert(reaction),
            RealtimeEvent::ReactionRemoved(reaction) => self.reactions.remove(&reaction),
        }
    }

    pub fn apply_raw(&mut self, payload: &str) -> BoardResult<bool> {
        Ok(self.apply(decode_event(payload)?))
    }

    pub fn has_reacted(&self, message_id: MessageId, user_id: UserId, emoji: &str) -> bool {
        self.reactions.contains(&Reaction {
            message_id,
            user_id,
            emoji: emoji.to_string(),
        })
    }

    /// Emoji → number of users who reacted with it.
    pub fn reaction_counts(&self, message_id: MessageId) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for reaction in self.reactions.iter().filter(|r| r.message_id == message_id) {
            *counts.entry(reaction.emoji.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// The event that flips `user_id`'s `emoji` reaction on a message.
    pub fn reaction_toggle(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
    ) -> RealtimeEvent {
        let reaction = Reaction {
            message_id,
            user_id,
            emoji: emoji.to_string(),
        };
        if self.reactions.contains(&reaction) {
            RealtimeEvent::ReactionRemoved(reaction)
        } else {
            RealtimeEvent::ReactionAdded(reaction)
        }
    }

    /// Subscribe to the conversation topic and keep a shared feed current
    /// until `scope` is cancelled or the channel closes.
    pub fn follow(
        channel: Arc<dyn RealtimeChannel>,
        feed: ConversationFeed,
        scope: &TaskScope,
    ) -> Arc<Mutex<ConversationFeed>> {
        let topic = Topic::Conversation(feed.conversation_id);
        let mut rx = channel.subscribe(&topic);
        let shared = Arc::new(Mutex::new(feed));
        let target = shared.clone();

        // Dropping the handle detaches; the scope still aborts the loop.
        let _ = scope.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        if let Err(e) = target.lock().await.apply_raw(&payload) {
                            tracing::warn!("Dropping malformed payload on {}: {}", topic, e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Feed for {} lagged, skipped {} event(s)", topic, skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Channel for {} closed", topic);
                        break;
                    }
                }
            }
        });
        shared
    }
}

/// Publish a message to its conversation and to the shared messages topic.
pub async fn send_message(
    channel: &dyn RealtimeChannel,
    message: &ChatMessage,
) -> BoardResult<()> {
    let payload = encode_event(&RealtimeEvent::Message(message.clone()))?;
    channel
        .publish(&Topic::Conversation(message.conversation_id), payload.clone())
        .await?;
    channel.publish(&Topic::Messages, payload).await
}

/// Publish the event that flips a reaction, based on the feed's current view.
pub async fn toggle_reaction(
    channel: &dyn RealtimeChannel,
    feed: &ConversationFeed,
    message_id: MessageId,
    user_id: UserId,
    emoji: &str,
) -> BoardResult<RealtimeEvent> {
    let event = feed.reaction_toggle(message_id, user_id, emoji);
    channel
        .publish(&Topic::Conversation(feed.conversation_id), encode_event(&event)?)
        .await?;
    Ok(event)
}
