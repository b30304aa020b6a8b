// TestDependencies - in-memory implementations for testing
//
// InMemoryChatStore implements every chat storage trait behind one mutex, so a
// room and its participants are written atomically just like the Postgres
// transaction. FailingNats lets tests exercise broker outages.

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{BaseDirectory, BaseMessageStore, BaseParticipantStore, BaseRoomStore, NatsPublisher};
use crate::common::{ListingId, MemberId, MessageId, ParticipantId, RoomId};
use crate::domains::chatrooms::models::{ChatMessage, ChatRoom, RoomParticipant};
use crate::domains::listings::Listing;
use crate::domains::member::Member;

// =============================================================================
// In-memory chat store
// =============================================================================

#[derive(Default)]
struct ChatTables {
    members: Vec<Member>,
    listings: Vec<Listing>,
    rooms: Vec<ChatRoom>,
    participants: Vec<RoomParticipant>,
    messages: Vec<ChatMessage>,
}

/// Rows are kept in insertion order, which is also creation order.
#[derive(Default)]
pub struct InMemoryChatStore {
    tables: Mutex<ChatTables>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, ChatTables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a member the way the membership system would.
    pub fn add_member(&self, email: &str, name: &str) -> Member {
        let member = Member {
            id: MemberId::new(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.tables().members.push(member.clone());
        member
    }

    /// Register a listing the way the listings system would.
    pub fn add_listing(&self, title: &str, author_id: MemberId) -> Listing {
        let listing = Listing {
            id: ListingId::new(),
            title: title.to_string(),
            author_id,
            created_at: Utc::now(),
        };
        self.tables().listings.push(listing.clone());
        listing
    }

    pub fn rooms(&self) -> Vec<ChatRoom> {
        self.tables().rooms.clone()
    }

    pub fn participants(&self) -> Vec<RoomParticipant> {
        self.tables().participants.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.tables().messages.clone()
    }
}

#[async_trait]
impl BaseRoomStore for InMemoryChatStore {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<ChatRoom>> {
        Ok(self.tables().rooms.iter().find(|r| r.id == room_id).cloned())
    }

    async fn find_by_listing_and_initiator(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
    ) -> Result<Option<ChatRoom>> {
        Ok(self
            .tables()
            .rooms
            .iter()
            .find(|r| r.listing_id == listing_id && r.initiator_id == initiator_id)
            .cloned())
    }

    async fn create_with_participants(
        &self,
        listing_id: ListingId,
        initiator_id: MemberId,
        room_name: &str,
        members: [MemberId; 2],
    ) -> Result<(ChatRoom, bool)> {
        let mut tables = self.tables();

        if let Some(existing) = tables
            .rooms
            .iter()
            .find(|r| r.listing_id == listing_id && r.initiator_id == initiator_id)
        {
            return Ok((existing.clone(), false));
        }

        for member_id in members {
            if !tables.members.iter().any(|m| m.id == member_id) {
                bail!("participant {} does not exist", member_id);
            }
        }

        let now = Utc::now();
        let room = ChatRoom {
            id: RoomId::new(),
            listing_id,
            initiator_id,
            room_name: room_name.to_string(),
            created_at: now,
        };
        tables.rooms.push(room.clone());

        for member_id in members {
            tables.participants.push(RoomParticipant {
                id: ParticipantId::new(),
                room_id: room.id,
                member_id,
                is_active: true,
                left_at: None,
                created_at: now,
            });
        }

        Ok((room, true))
    }

    async fn delete(&self, room_id: RoomId) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.rooms.len();
        tables.rooms.retain(|r| r.id != room_id);
        tables.participants.retain(|p| p.room_id != room_id);
        tables.messages.retain(|m| m.room_id != room_id);
        Ok(tables.rooms.len() < before)
    }
}

#[async_trait]
impl BaseParticipantStore for InMemoryChatStore {
    async fn find_active(
        &self,
        room_id: RoomId,
        member_id: MemberId,
    ) -> Result<Option<RoomParticipant>> {
        Ok(self
            .tables()
            .participants
            .iter()
            .find(|p| p.room_id == room_id && p.member_id == member_id && p.is_active)
            .cloned())
    }

    async fn mark_left(&self, participant_id: ParticipantId) -> Result<Option<RoomParticipant>> {
        let mut tables = self.tables();
        let Some(row) = tables
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id && p.is_active)
        else {
            return Ok(None);
        };

        row.is_active = false;
        row.left_at = Some(Utc::now().max(row.created_at));
        Ok(Some(row.clone()))
    }

    async fn has_active(&self, room_id: RoomId) -> Result<bool> {
        Ok(self
            .tables()
            .participants
            .iter()
            .any(|p| p.room_id == room_id && p.is_active))
    }

    async fn list_active_for_member(&self, member_id: MemberId) -> Result<Vec<RoomParticipant>> {
        Ok(self
            .tables()
            .participants
            .iter()
            .rev()
            .filter(|p| p.member_id == member_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<RoomParticipant>> {
        Ok(self
            .tables()
            .participants
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseMessageStore for InMemoryChatStore {
    async fn insert(
        &self,
        room_id: RoomId,
        sender_id: MemberId,
        content: &str,
    ) -> Result<ChatMessage> {
        let mut tables = self.tables();
        if !tables.rooms.iter().any(|r| r.id == room_id) {
            bail!("chat room {} does not exist", room_id);
        }

        let message = ChatMessage {
            id: MessageId::new(),
            room_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<ChatMessage>> {
        Ok(self
            .tables()
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn latest_by_room(&self, room_id: RoomId) -> Result<Option<ChatMessage>> {
        Ok(self
            .tables()
            .messages
            .iter()
            .rev()
            .find(|m| m.room_id == room_id)
            .cloned())
    }
}

#[async_trait]
impl BaseDirectory for InMemoryChatStore {
    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<Member>> {
        Ok(self
            .tables()
            .members
            .iter()
            .find(|m| m.id == member_id)
            .cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        Ok(self
            .tables()
            .members
            .iter()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_listing_by_id(&self, listing_id: ListingId) -> Result<Option<Listing>> {
        Ok(self
            .tables()
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned())
    }
}

// =============================================================================
// Failing broker
// =============================================================================

/// Publisher whose every publish fails, counting the attempts.
#[derive(Default)]
pub struct FailingNats {
    attempts: AtomicUsize,
}

impl FailingNats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NatsPublisher for FailingNats {
    async fn publish(&self, subject: String, _payload: Bytes) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("broker unavailable for subject {}", subject)
    }
}
