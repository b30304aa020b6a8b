//! Postgres backend for the chat storage traits.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{BaseDirectory, BaseMessageStore, BaseParticipantStore, BaseRoomStore};
use crate::common::{ListingId, MemberId, ParticipantId, RoomId};
use crate::domains::chatrooms::models::{ChatMessage, ChatRoom, RoomParticipant};
use crate::domains::listings::Listing;
use crate::domains::member::Member;

#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseRoomStore for PgChatStore {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<ChatRoom>> {
        ChatRoom::find_by_id(room_id, &self.pool).await
    }

    async fn find_by_listing_and_initiator(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
    ) -> Result<Option<ChatRoom>> {
        ChatRoom::find_by_listing_and_initiator(listing_id, initiator_id, &self.pool).await
    }

    async fn create_with_participants(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
        room_name: &str,
        members: [MemberId; 2],
    ) -> Result<(ChatRoom, bool)> {
        if let Some(room) = ChatRoom::create_with_participants(
            listing_id,
            initiator_id,
            room_name,
            members,
            &self.pool,
        )
        .await?
        {
            return Ok((room, true));
        }

        debug!(
            listing_id = %listing_id,
            initiator_id = %initiator_id,
            "Room key already taken, loading existing room"
        );
        let existing = ChatRoom::find_by_listing_and_initiator(listing_id, initiator_id, &self.pool)
            .await?
            .context("chat room disappeared after unique-key conflict")?;
        Ok((existing, false))
    }

    async fn delete(&self, room_id: RoomId) -> Result<bool> {
        ChatRoom::delete(room_id, &self.pool).await
    }
}

#[async_trait]
impl BaseParticipantStore for PgChatStore {
    async fn find_active(
        &self,
        room_id: RoomId,
        member_id: MemberId,
    ) -> Result<Option<RoomParticipant>> {
        RoomParticipant::find_active(room_id, member_id, &self.pool).await
    }

    async fn mark_left(&self, participant_id: ParticipantId) -> Result<Option<RoomParticipant>> {
        RoomParticipant::mark_left(participant_id, &self.pool).await
    }

    async fn has_active(&self, room_id: RoomId) -> Result<bool> {
        RoomParticipant::has_active(room_id, &self.pool).await
    }

    async fn list_active_for_member(&self, member_id: MemberId) -> Result<Vec<RoomParticipant>> {
        RoomParticipant::find_active_for_member(member_id, &self.pool).await
    }

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<RoomParticipant>> {
        RoomParticipant::find_by_room(room_id, &self.pool).await
    }
}

#[async_trait]
impl BaseMessageStore for PgChatStore {
    async fn insert(
        &self,
        room_id: RoomId,
        sender_id: MemberId,
        content: &str,
    ) -> Result<ChatMessage> {
        ChatMessage::insert(room_id, sender_id, content, &self.pool).await
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<ChatMessage>> {
        ChatMessage::find_by_room(room_id, &self.pool).await
    }

    async fn latest_by_room(&self, room_id: RoomId) -> Result<Option<ChatMessage>> {
        ChatMessage::find_latest_by_room(room_id, &self.pool).await
    }
}

#[async_trait]
impl BaseDirectory for PgChatStore {
    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<Member>> {
        Member::find_by_id(member_id, &self.pool).await
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        Member::find_by_email(email, &self.pool).await
    }

    async fn find_listing_by_id(&self, listing_id: ListingId) -> Result<Option<Listing>> {
        Listing::find_by_id(listing_id, &self.pool).await
    }
}
