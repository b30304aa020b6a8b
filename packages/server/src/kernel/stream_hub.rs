//! In-process pub/sub hub feeding the live chat streams.
//!
//! The broker relay publishes each delivered chat payload to the room's topic
//! (`chat:<room id>`); SSE connections subscribe to that topic. Topics are
//! opaque strings here.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Topic-keyed broadcast channels. Cheap to clone; clones share the topics.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    /// 256 buffered payloads per topic; slower receivers see a lag.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Fan a payload out to the topic's receivers. Returns how many got it;
    /// a topic nobody subscribed to drops the payload.
    pub async fn publish(&self, topic: &str, value: serde_json::Value) -> usize {
        match self.channels.read().await.get(topic) {
            Some(tx) => tx.send(value).unwrap_or(0),
            None => 0,
        }
    }

    /// Receiver for a topic, opening the topic on first use.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        self.channels
            .write()
            .await
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Remove channels with zero subscribers. Returns how many were dropped.
    pub async fn cleanup(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }

    /// Number of live receivers on a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_room_payload() {
        let hub = StreamHub::new();
        let mut rx = hub.subscribe("chat:room-1").await;

        let value = serde_json::json!({"messageType": "NORMAL", "content": "Still available?"});
        hub.publish("chat:room-1", value.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let hub = StreamHub::new();
        let reached = hub
            .publish("chat:nobody", serde_json::json!({"content": "dropped"}))
            .await;
        assert_eq!(reached, 0);
        assert_eq!(hub.subscriber_count("chat:nobody").await, 0);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let hub = StreamHub::new();
        let mut room_a = hub.subscribe("chat:a").await;
        let _room_b = hub.subscribe("chat:b").await;

        hub.publish("chat:b", serde_json::json!({"content": "for b"}))
            .await;

        assert!(room_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cleanup_removes_abandoned_topics() {
        let hub = StreamHub::new();
        let rx = hub.subscribe("chat:ephemeral").await;
        let _kept = hub.subscribe("chat:kept").await;

        drop(rx);
        assert_eq!(hub.cleanup().await, 1);
        assert_eq!(hub.channels.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_both_participants_receive() {
        let hub = StreamHub::new();
        let mut seller = hub.subscribe("chat:deal").await;
        let mut buyer = hub.subscribe("chat:deal").await;
        assert_eq!(hub.subscriber_count("chat:deal").await, 2);

        let value = serde_json::json!({"content": "deal"});
        assert_eq!(hub.publish("chat:deal", value.clone()).await, 2);

        assert_eq!(seller.recv().await.unwrap(), value);
        assert_eq!(buyer.recv().await.unwrap(), value);
    }
}
