use std::sync::Arc;
use tracing::debug;

use crate::common::{MemberId, RoomId};
use crate::domains::chatrooms::error::{ChatError, Entity};
use crate::domains::chatrooms::models::ChatMessage;
use crate::kernel::{BaseDirectory, BaseMessageStore, BaseRoomStore};

/// Durable, append-only message log per room.
///
/// Checks that the sender and the room exist; who may write is decided by
/// the caller.
pub struct MessageStore {
    messages: Arc<dyn BaseMessageStore>,
    rooms: Arc<dyn BaseRoomStore>,
    directory: Arc<dyn BaseDirectory>,
}

impl MessageStore {
    pub fn new(
        messages: Arc<dyn BaseMessageStore>,
        rooms: Arc<dyn BaseRoomStore>,
        directory: Arc<dyn BaseDirectory>,
    ) -> Self {
        Self {
            messages,
            rooms,
            directory,
        }
    }

    pub async fn save(
        &self,
        sender_id: MemberId,
        room_id: RoomId,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        if self.directory.find_member_by_id(sender_id).await?.is_none() {
            return Err(ChatError::NotFound(Entity::Member));
        }
        if self.rooms.find_by_id(room_id).await?.is_none() {
            return Err(ChatError::NotFound(Entity::Room));
        }

        let message = self.messages.insert(room_id, sender_id, content).await?;
        debug!(room_id = %room_id, message_id = %message.id, "Chat message stored");
        Ok(message)
    }

    /// All messages of the room, oldest first.
    pub async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.messages.list_by_room(room_id).await?)
    }

    pub async fn latest_by_room(&self, room_id: RoomId) -> Result<Option<ChatMessage>, ChatError> {
        Ok(self.messages.latest_by_room(room_id).await?)
    }
}
