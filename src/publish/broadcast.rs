use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// One message for the local real-time display feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayFrame {
    pub topic: String,
    pub payload: String,
}

/// Fan-out to display clients subscribed to a topic
#[async_trait]
pub trait DisplayBroadcaster: Send + Sync {
    /// Returns whether the payload was handed off
    async fn broadcast(&self, topic: &str, payload: &str) -> bool;
}

/// In-process broadcaster backed by a tokio broadcast channel
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<DisplayFrame>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayFrame> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl DisplayBroadcaster for ChannelBroadcaster {
    async fn broadcast(&self, topic: &str, payload: &str) -> bool {
        let frame = DisplayFrame {
            topic: topic.to_string(),
            payload: payload.to_string(),
        };

        // No subscribers is not an error: nobody is watching the feed
        let receivers = self.sender.send(frame).unwrap_or(0);
        tracing::debug!(topic = %topic, receivers = receivers, "Display frame sent");
        true
    }
}
