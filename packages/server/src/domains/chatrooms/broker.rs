//! Cross-instance fan-out of chat messages.
//!
//! Every instance publishes to one well-known subject and every instance
//! subscribes to it; the relay forwards each payload to the local StreamHub
//! topic of its room, where the SSE connections of that room listen.
//! Delivery is best-effort: a failed publish never undoes a stored message.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::data::MessageDto;
use crate::common::RoomId;
use crate::kernel::{NatsPublisher, StreamHub};

pub const DEFAULT_CHAT_SUBJECT: &str = "chat.messages";

/// StreamHub topic carrying the live messages of one room
pub fn room_topic(room_id: RoomId) -> String {
    format!("chat:{}", room_id)
}

#[derive(Clone)]
pub struct MessageBroker {
    publisher: Arc<dyn NatsPublisher>,
    subject: String,
}

impl MessageBroker {
    pub fn new(publisher: Arc<dyn NatsPublisher>, subject: impl Into<String>) -> Self {
        Self {
            publisher,
            subject: subject.into(),
        }
    }

    /// Serialize and hand the message to the transport.
    pub async fn publish(&self, message: &MessageDto) -> Result<()> {
        let payload = serde_json::to_vec(message).context("Failed to serialize chat message")?;
        self.publisher
            .publish(self.subject.clone(), Bytes::from(payload))
            .await
            .with_context(|| format!("Failed to publish to {}", self.subject))
    }

    /// Publish, logging instead of returning a failure.
    pub async fn publish_or_log(&self, message: &MessageDto) {
        match self.publish(message).await {
            Ok(()) => debug!(
                room_id = %message.room_id,
                message_type = message.message_type.as_str(),
                "Chat message published"
            ),
            Err(e) => warn!(
                room_id = %message.room_id,
                message_type = message.message_type.as_str(),
                error = %e,
                "Chat message publish failed; stored copy is unaffected"
            ),
        }
    }
}

/// Forward one broker payload to the local subscribers of its room.
pub async fn relay_to_hub(hub: &StreamHub, payload: &[u8]) -> Result<RoomId> {
    let message: MessageDto =
        serde_json::from_slice(payload).context("Malformed chat payload on broker channel")?;
    let value = serde_json::to_value(&message)?;
    let receivers = hub.publish(&room_topic(message.room_id), value).await;
    debug!(room_id = %message.room_id, receivers, "Relayed chat payload");
    Ok(message.room_id)
}

/// Single-instance transport: publishing goes straight into the local hub.
pub struct LoopbackPublisher {
    hub: StreamHub,
}

impl LoopbackPublisher {
    pub fn new(hub: StreamHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl NatsPublisher for LoopbackPublisher {
    async fn publish(&self, _subject: String, payload: Bytes) -> Result<()> {
        relay_to_hub(&self.hub, &payload).await.map(|_| ())
    }
}

/// Subscribe to the chat subject and relay every delivery into `hub`.
pub async fn spawn_nats_relay(
    client: async_nats::Client,
    subject: String,
    hub: StreamHub,
) -> Result<JoinHandle<()>> {
    let mut subscriber = client
        .subscribe(subject.clone())
        .await
        .with_context(|| format!("Failed to subscribe to {}", subject))?;

    info!(subject = %subject, "Chat relay subscribed");

    Ok(tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            if let Err(e) = relay_to_hub(&hub, &message.payload).await {
                warn!(subject = %subject, error = %e, "Dropping chat payload");
            }
        }
        warn!(subject = %subject, "Chat relay subscription ended");
    }))
}
