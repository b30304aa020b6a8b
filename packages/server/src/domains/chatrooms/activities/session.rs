use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{resolve_caller, MessageStore, ParticipantRegistry};
use crate::common::{MemberId, RoomId};
use crate::domains::chatrooms::broker::MessageBroker;
use crate::domains::chatrooms::data::{MessageDto, MessageType, RoomSummary};
use crate::domains::chatrooms::error::{ChatError, Entity};
use crate::domains::chatrooms::models::{ChatMessage, ChatRoom};
use crate::domains::member::Member;
use crate::kernel::{BaseDirectory, BaseParticipantStore, BaseRoomStore};

const UNKNOWN_SENDER_NAME: &str = "Unknown member";

/// Caller-facing chat operations: reading history, listing rooms, sending.
pub struct ChatSession {
    rooms: Arc<dyn BaseRoomStore>,
    participants: Arc<dyn BaseParticipantStore>,
    directory: Arc<dyn BaseDirectory>,
    messages: MessageStore,
    registry: Arc<ParticipantRegistry>,
    broker: MessageBroker,
}

impl ChatSession {
    pub fn new(
        rooms: Arc<dyn BaseRoomStore>,
        participants: Arc<dyn BaseParticipantStore>,
        directory: Arc<dyn BaseDirectory>,
        messages: MessageStore,
        registry: Arc<ParticipantRegistry>,
        broker: MessageBroker,
    ) -> Self {
        Self {
            rooms,
            participants,
            directory,
            messages,
            registry,
            broker,
        }
    }

    /// Full history of a room, oldest first. Only ACTIVE participants may read.
    pub async fn get_messages(
        &self,
        room_id: RoomId,
        identity: &str,
    ) -> Result<Vec<MessageDto>, ChatError> {
        let caller = resolve_caller(self.directory.as_ref(), identity).await?;
        self.require_room(room_id).await?;

        if !self.registry.is_active_participant(room_id, caller.id).await? {
            return Err(ChatError::Forbidden);
        }

        let history = self.messages.list_by_room(room_id).await?;
        let mut senders: HashMap<MemberId, Option<Member>> = HashMap::new();
        let mut views = Vec::with_capacity(history.len());

        for message in &history {
            if !senders.contains_key(&message.sender_id) {
                let sender = self.directory.find_member_by_id(message.sender_id).await?;
                senders.insert(message.sender_id, sender);
            }
            views.push(render(message, senders.get(&message.sender_id).and_then(Option::as_ref)));
        }

        Ok(views)
    }

    /// Rooms the caller is ACTIVE in, most recently joined first.
    pub async fn list_my_rooms(&self, identity: &str) -> Result<Vec<RoomSummary>, ChatError> {
        let caller = resolve_caller(self.directory.as_ref(), identity).await?;
        let memberships = self.participants.list_active_for_member(caller.id).await?;

        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            // The room may have been purged after the membership was read.
            let Some(room) = self.rooms.find_by_id(membership.room_id).await? else {
                continue;
            };
            let last_message = self
                .messages
                .latest_by_room(room.id)
                .await?
                .map(|m| m.content);

            summaries.push(RoomSummary {
                room_id: room.id,
                room_name: room.room_name,
                listing_id: room.listing_id,
                last_message,
            });
        }

        Ok(summaries)
    }

    /// Store an inbound message. No participation check and no fan-out.
    pub async fn save_incoming_message(&self, dto: &MessageDto) -> Result<ChatMessage, ChatError> {
        self.messages
            .save(dto.sender_id, dto.room_id, &dto.content)
            .await
    }

    /// Store an inbound message, then publish it to the room's subscribers.
    pub async fn deliver_incoming_message(&self, dto: &MessageDto) -> Result<MessageDto, ChatError> {
        let saved = self.save_incoming_message(dto).await?;
        let sender = self.directory.find_member_by_id(saved.sender_id).await?;
        let view = render(&saved, sender.as_ref());

        self.broker.publish_or_log(&view).await;
        Ok(view)
    }

    /// Live send path: the caller must be an ACTIVE participant of the room.
    pub async fn send_message(
        &self,
        room_id: RoomId,
        identity: &str,
        content: &str,
    ) -> Result<MessageDto, ChatError> {
        let caller = resolve_caller(self.directory.as_ref(), identity).await?;
        self.require_room(room_id).await?;

        if !self.registry.is_active_participant(room_id, caller.id).await? {
            return Err(ChatError::Forbidden);
        }
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let inbound = MessageDto {
            sender_name: caller.name.clone(),
            content: content.to_string(),
            sender_id: caller.id,
            room_id,
            sender_email: Some(caller.email.clone()),
            message_type: MessageType::Normal,
        };
        let delivered = self.deliver_incoming_message(&inbound).await?;

        info!(room_id = %room_id, sender_id = %caller.id, "Chat message sent");
        Ok(delivered)
    }

    /// Check that the caller may subscribe to the room's live stream.
    pub async fn authorize_stream(
        &self,
        room_id: RoomId,
        identity: &str,
    ) -> Result<MemberId, ChatError> {
        let caller = resolve_caller(self.directory.as_ref(), identity).await?;
        self.require_room(room_id).await?;

        if !self.registry.is_active_participant(room_id, caller.id).await? {
            return Err(ChatError::Forbidden);
        }
        Ok(caller.id)
    }

    async fn require_room(&self, room_id: RoomId) -> Result<ChatRoom, ChatError> {
        self.rooms
            .find_by_id(room_id)
            .await?
            .ok_or(ChatError::NotFound(Entity::Room))
    }
}

fn render(message: &ChatMessage, sender: Option<&Member>) -> MessageDto {
    match sender {
        Some(sender) => MessageDto::from_message(message, sender),
        None => {
            warn!(
                message_id = %message.id,
                sender_id = %message.sender_id,
                "Sender missing from directory"
            );
            MessageDto {
                sender_name: UNKNOWN_SENDER_NAME.to_string(),
                content: message.content.clone(),
                sender_id: message.sender_id,
                room_id: message.room_id,
                sender_email: None,
                message_type: MessageType::Normal,
            }
        }
    }
}
