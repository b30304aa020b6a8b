use std::sync::Arc;
use tracing::{debug, info};

use super::resolve_caller;
use crate::common::{ListingId, RoomId};
use crate::domains::chatrooms::error::{ChatError, Entity};
use crate::kernel::{BaseDirectory, BaseRoomStore};

/// Opens negotiation rooms, one per (listing, initiator) pair.
pub struct ChatRoomManager {
    rooms: Arc<dyn BaseRoomStore>,
    directory: Arc<dyn BaseDirectory>,
}

impl ChatRoomManager {
    pub fn new(rooms: Arc<dyn BaseRoomStore>, directory: Arc<dyn BaseDirectory>) -> Self {
        Self { rooms, directory }
    }

    /// Return the caller's room for the listing, creating it on first contact.
    ///
    /// A new room starts with two ACTIVE participants: the caller and the
    /// listing author. `room_name` defaults to `"<listing title> - <caller name>"`
    /// and is ignored when the room already exists.
    pub async fn create_or_get_room(
        &self,
        listing_id: ListingId,
        identity: &str,
        room_name: Option<String>,
    ) -> Result<RoomId, ChatError> {
        let requester = resolve_caller(self.directory.as_ref(), identity).await?;

        let listing = self
            .directory
            .find_listing_by_id(listing_id)
            .await?
            .ok_or(ChatError::NotFound(Entity::Listing))?;

        if listing.author_id == requester.id {
            return Err(ChatError::SelfChat);
        }

        if let Some(existing) = self
            .rooms
            .find_by_listing_and_initiator(listing.id, requester.id)
            .await?
        {
            debug!(room_id = %existing.id, listing_id = %listing.id, "Reusing chat room");
            return Ok(existing.id);
        }

        let room_name = room_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{} - {}", listing.title, requester.name));

        let (room, created) = self
            .rooms
            .create_with_participants(
                listing.id,
                requester.id,
                &room_name,
                [requester.id, listing.author_id],
            )
            .await?;

        if created {
            info!(
                room_id = %room.id,
                listing_id = %listing.id,
                initiator_id = %requester.id,
                author_id = %listing.author_id,
                "Chat room created"
            );
        } else {
            debug!(room_id = %room.id, "Concurrent create resolved to existing room");
        }

        Ok(room.id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::kernel::{BaseParticipantStore, BaseRoomStore};

    #[tokio::test]
    async fn test_first_contact_creates_room_with_two_active_participants() {
        let fx = Fixture::new();

        let room_id = fx.open_room().await;

        let participants = fx.store.list_for_room(room_id).await.unwrap();
        assert_eq!(participants.len(), 2);
        assert!(participants.iter().all(|p| p.is_active && p.left_at.is_none()));
        assert_eq!(participants[0].member_id, fx.buyer.id);
        assert_eq!(participants[1].member_id, fx.seller.id);
    }

    #[tokio::test]
    async fn test_default_room_name() {
        let fx = Fixture::new();

        let room_id = fx.open_room().await;

        let room = BaseRoomStore::find_by_id(fx.store.as_ref(), room_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.room_name, "Road bike - Bob");
        assert_eq!(room.initiator_id, fx.buyer.id);
        assert_eq!(room.listing_id, fx.listing.id);
    }

    #[tokio::test]
    async fn test_explicit_room_name() {
        let fx = Fixture::new();

        let room_id = fx
            .manager
            .create_or_get_room(fx.listing.id, BUYER, Some("Bike haggling".to_string()))
            .await
            .unwrap();

        let room = BaseRoomStore::find_by_id(fx.store.as_ref(), room_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.room_name, "Bike haggling");
    }

    #[tokio::test]
    async fn test_repeat_call_returns_same_room_without_new_rows() {
        let fx = Fixture::new();

        let first = fx.open_room().await;
        let second = fx
            .manager
            .create_or_get_room(fx.listing.id, BUYER, Some("ignored".to_string()))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.store.rooms().len(), 1);
        assert_eq!(fx.store.participants().len(), 2);
    }

    #[tokio::test]
    async fn test_different_initiators_get_different_rooms() {
        let fx = Fixture::new();

        let buyer_room = fx.open_room().await;
        let stranger_room = fx
            .manager
            .create_or_get_room(fx.listing.id, STRANGER, None)
            .await
            .unwrap();

        assert_ne!(buyer_room, stranger_room);
        assert_eq!(fx.store.rooms().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_converge() {
        let fx = Fixture::new();

        let (a, b) = tokio::join!(
            fx.manager.create_or_get_room(fx.listing.id, BUYER, None),
            fx.manager.create_or_get_room(fx.listing.id, BUYER, None),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fx.store.rooms().len(), 1);
        assert_eq!(fx.store.participants().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_identity_writes_nothing() {
        let fx = Fixture::new();

        let err = fx
            .manager
            .create_or_get_room(fx.listing.id, "", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Unauthenticated));
        assert!(fx.store.rooms().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_listing() {
        let fx = Fixture::new();

        let err = fx
            .manager
            .create_or_get_room(ListingId::new(), BUYER, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::NotFound(Entity::Listing)));
        assert!(fx.store.rooms().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let fx = Fixture::new();

        let err = fx
            .manager
            .create_or_get_room(fx.listing.id, "ghost@example.com", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::NotFound(Entity::Member)));
    }

    #[tokio::test]
    async fn test_author_cannot_open_room_on_own_listing() {
        let fx = Fixture::new();

        let err = fx
            .manager
            .create_or_get_room(fx.listing.id, SELLER, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::SelfChat));
        assert!(fx.store.rooms().is_empty());
        assert!(fx.store.participants().is_empty());
    }

    #[tokio::test]
    async fn test_existing_room_returned_even_after_leave() {
        let fx = Fixture::new();
        let room_id = fx.open_room().await;
        fx.registry.leave(room_id, BUYER).await.unwrap();

        let again = fx.open_room().await;

        assert_eq!(again, room_id);
        assert!(fx
            .store
            .find_active(room_id, fx.buyer.id)
            .await
            .unwrap()
            .is_none());
    }
}
