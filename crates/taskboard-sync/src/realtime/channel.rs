use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use taskboard_core::{BoardResult, SyncConfig};
use tokio::sync::broadcast;

use super::Topic;

/// Transport for topic-addressed payloads. Payloads are already-encoded
/// event strings; see [`super::encode_event`].
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn publish(&self, topic: &Topic, payload: String) -> BoardResult<()>;

    /// Receive every payload published on `topic` from now on.
    fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<String>;
}

/// Channel that fans payloads out to subscribers in the same process.
pub struct InProcessChannel {
    capacity: usize,
    topics: Mutex<HashMap<Topic, broadcast::Sender<String>>>,
}

impl InProcessChannel {
    /// Each topic buffers up to `capacity` payloads per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.effective_event_buffer())
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<Topic, broadcast::Sender<String>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RealtimeChannel for InProcessChannel {
    async fn publish(&self, topic: &Topic, payload: String) -> BoardResult<()> {
        let sender = {
            let mut topics = self.topics();
            // A topic whose last receiver is gone is recreated on the next
            // subscribe.
            topics.retain(|_, tx| tx.receiver_count() > 0);
            topics.get(topic).cloned()
        };
        match sender.map(|tx| tx.send(payload)) {
            Some(Ok(receivers)) => {
                tracing::debug!("Published to {} ({} receiver(s))", topic, receivers)
            }
            _ => tracing::debug!("Published to {} with no subscribers", topic),
        }
        Ok(())
    }

    fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<String> {
        self.topics()
            .entry(*topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}
