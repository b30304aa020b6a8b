// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Chat rules (who may read, when a room is purged) live in domains/chatrooms/activities
// and are written against these seams.
//
// Naming convention: Base* for trait names (e.g., BaseRoomStore, BaseDirectory)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{ListingId, MemberId, ParticipantId, RoomId};
use crate::domains::chatrooms::models::{ChatMessage, ChatRoom, RoomParticipant};
use crate::domains::listings::Listing;
use crate::domains::member::Member;

// =============================================================================
// Room Store
// =============================================================================

#[async_trait]
pub trait BaseRoomStore: Send + Sync {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<ChatRoom>>;

    async fn find_by_listing_and_initiator(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
    ) -> Result<Option<ChatRoom>>;

    /// Create a room with an ACTIVE participant per member, all or nothing.
    ///
    /// If the (listing, initiator) key is already taken the existing room is
    /// returned with `false` and nothing is written.
    async fn create_with_participants(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
        room_name: &str,
        members: [MemberId; 2],
    ) -> Result<(ChatRoom, bool)>;

    /// Delete a room together with its participants and messages
    async fn delete(&self, room_id: RoomId) -> Result<bool>;
}

// =============================================================================
// Participant Store
// =============================================================================

#[async_trait]
pub trait BaseParticipantStore: Send + Sync {
    async fn find_active(
        &self,
        room_id: RoomId,
        member_id: MemberId,
    ) -> Result<Option<RoomParticipant>>;

    /// ACTIVE -> LEFT. `None` when the row had already left.
    async fn mark_left(&self, participant_id: ParticipantId) -> Result<Option<RoomParticipant>>;

    async fn has_active(&self, room_id: RoomId) -> Result<bool>;

    /// Most recently joined first
    async fn list_active_for_member(&self, member_id: MemberId) -> Result<Vec<RoomParticipant>>;

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<RoomParticipant>>;
}

// =============================================================================
// Message Store
// =============================================================================

#[async_trait]
pub trait BaseMessageStore: Send + Sync {
    async fn insert(
        &self,
        room_id: RoomId,
        sender_id: MemberId,
        content: &str,
    ) -> Result<ChatMessage>;

    /// Oldest first
    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<ChatMessage>>;

    async fn latest_by_room(&self, room_id: RoomId) -> Result<Option<ChatMessage>>;
}

// =============================================================================
// Directory (read-only members and listings)
// =============================================================================

#[async_trait]
pub trait BaseDirectory: Send + Sync {
    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<Member>>;

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>>;

    async fn find_listing_by_id(&self, listing_id: ListingId) -> Result<Option<Listing>>;
}
