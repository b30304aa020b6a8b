use std::sync::Arc;
use tracing::{debug, info, warn};

use super::resolve_caller;
use crate::common::{MemberId, RoomId};
use crate::domains::chatrooms::broker::MessageBroker;
use crate::domains::chatrooms::data::{MessageDto, MessageType};
use crate::domains::chatrooms::error::ChatError;
use crate::kernel::{BaseDirectory, BaseParticipantStore, BaseRoomStore};

/// Tracks membership episodes and handles leaving.
pub struct ParticipantRegistry {
    participants: Arc<dyn BaseParticipantStore>,
    rooms: Arc<dyn BaseRoomStore>,
    directory: Arc<dyn BaseDirectory>,
    broker: MessageBroker,
    purge_abandoned: bool,
}

impl ParticipantRegistry {
    pub fn new(
        participants: Arc<dyn BaseParticipantStore>,
        rooms: Arc<dyn BaseRoomStore>,
        directory: Arc<dyn BaseDirectory>,
        broker: MessageBroker,
        purge_abandoned: bool,
    ) -> Self {
        Self {
            participants,
            rooms,
            directory,
            broker,
            purge_abandoned,
        }
    }

    /// Move the caller's ACTIVE row in the room to LEFT.
    ///
    /// The LEFT state is persisted first. Remaining members then get a leave
    /// notice; a failed publish does not fail the leave. When nobody ACTIVE
    /// remains there is no notice, and the room is deleted if purging is on.
    /// A failed purge is logged and does not fail the leave.
    pub async fn leave(&self, room_id: RoomId, identity: &str) -> Result<(), ChatError> {
        let member = resolve_caller(self.directory.as_ref(), identity).await?;

        let active = self
            .participants
            .find_active(room_id, member.id)
            .await?
            .ok_or(ChatError::NotParticipant)?;

        // A concurrent leave of the same row may have won between the two calls.
        let left = self
            .participants
            .mark_left(active.id)
            .await?
            .ok_or(ChatError::NotParticipant)?;

        info!(
            room_id = %room_id,
            member_id = %member.id,
            participant_id = %left.id,
            "Member left chat room"
        );

        if self.participants.has_active(room_id).await? {
            let notice = MessageDto::system_notice(
                room_id,
                format!("{} left the room", member.name),
                MessageType::LeaveNotification,
            );
            self.broker.publish_or_log(&notice).await;
        } else if self.purge_abandoned {
            self.purge_or_log(room_id).await;
        }

        Ok(())
    }

    /// Delete an abandoned room. The leave is already durable at this point,
    /// so a failure is logged and the room is kept.
    async fn purge_or_log(&self, room_id: RoomId) {
        match self.rooms.delete(room_id).await {
            Ok(true) => info!(room_id = %room_id, "Purged chat room with no active participants"),
            Ok(false) => debug!(room_id = %room_id, "Abandoned room already gone"),
            Err(e) => warn!(room_id = %room_id, error = %e, "Failed to purge abandoned chat room"),
        }
    }

    /// Whether the member currently holds an ACTIVE row in the room.
    pub async fn is_active_participant(
        &self,
        room_id: RoomId,
        member_id: MemberId,
    ) -> Result<bool, ChatError> {
        Ok(self
            .participants
            .find_active(room_id, member_id)
            .await?
            .is_some())
    }
}
