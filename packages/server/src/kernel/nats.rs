//! Broker publisher abstraction.
//!
//! Chat fan-out goes through `NatsPublisher` so the transport can be a real
//! NATS connection, the in-process loopback, or a recording double in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::RwLock;

/// A published message.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

impl PublishedMessage {
    /// Deserialize the payload as JSON.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }
}

#[async_trait]
pub trait NatsPublisher: Send + Sync {
    /// Publish a payload to a subject without waiting for delivery.
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

/// Real NATS client publisher.
pub struct NatsClientPublisher {
    client: async_nats::Client,
}

impl NatsClientPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Connect to the NATS server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .with_context(|| format!("Failed to connect to NATS at {}", url))?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl NatsPublisher for NatsClientPublisher {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.client.publish(subject, payload).await?;
        Ok(())
    }
}

/// Mock publisher that records everything published.
#[derive(Default)]
pub struct TestNats {
    published: RwLock<Vec<PublishedMessage>>,
}

impl TestNats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_publish(&self, subject: String, payload: Bytes) {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage { subject, payload });
    }

    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn messages_for_subject(&self, subject: &str) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.subject == subject)
            .cloned()
            .collect()
    }

    /// Decode every payload on a subject, skipping ones that don't parse as `T`.
    pub fn decoded_for_subject<T: serde::de::DeserializeOwned>(&self, subject: &str) -> Vec<T> {
        self.messages_for_subject(subject)
            .iter()
            .filter_map(|m| m.decode().ok())
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[async_trait]
impl NatsPublisher for TestNats {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.record_publish(subject, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_is_recorded_per_subject() {
        let nats = TestNats::new();

        nats.publish("chat.messages".to_string(), Bytes::from(r#"{"n":1}"#))
            .await
            .unwrap();
        nats.publish("chat.other".to_string(), Bytes::from(r#"{"n":2}"#))
            .await
            .unwrap();

        assert_eq!(nats.publish_count(), 2);
        assert_eq!(nats.messages_for_subject("chat.messages").len(), 1);
    }

    #[test]
    fn test_decoded_for_subject_skips_garbage() {
        let nats = TestNats::new();

        nats.record_publish("chat.messages".to_string(), Bytes::from(r#"{"n":1}"#));
        nats.record_publish("chat.messages".to_string(), Bytes::from("not json"));

        let decoded: Vec<serde_json::Value> = nats.decoded_for_subject("chat.messages");
        assert_eq!(decoded, vec![serde_json::json!({"n": 1})]);
    }
}
