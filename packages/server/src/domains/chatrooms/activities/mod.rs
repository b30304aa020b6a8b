//! Chatrooms domain activities
//!
//! Each component is constructed with the storage seams it needs and is
//! called from the HTTP routes in `server::routes::chat`.

mod messages;
mod participants;
mod room_manager;
mod session;

pub use messages::MessageStore;
pub use participants::ParticipantRegistry;
pub use room_manager::ChatRoomManager;
pub use session::ChatSession;

use crate::domains::chatrooms::error::{ChatError, Entity};
use crate::domains::member::Member;
use crate::kernel::BaseDirectory;

/// Resolve the caller identity (login email) to a member.
pub(crate) async fn resolve_caller(
    directory: &dyn BaseDirectory,
    identity: &str,
) -> Result<Member, ChatError> {
    let identity = identity.trim();
    if identity.is_empty() {
        return Err(ChatError::Unauthenticated);
    }

    directory
        .find_member_by_email(identity)
        .await?
        .ok_or(ChatError::NotFound(Entity::Member))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::*;
    use crate::domains::chatrooms::broker::{MessageBroker, DEFAULT_CHAT_SUBJECT};
    use crate::domains::listings::Listing;
    use crate::kernel::{InMemoryChatStore, NatsPublisher, TestNats};

    pub const SELLER: &str = "seller@example.com";
    pub const BUYER: &str = "buyer@example.com";
    pub const STRANGER: &str = "stranger@example.com";

    /// A seller with one listing, a buyer and an unrelated member.
    pub struct Fixture {
        pub store: Arc<InMemoryChatStore>,
        pub nats: Arc<TestNats>,
        pub seller: Member,
        pub buyer: Member,
        pub stranger: Member,
        pub listing: Listing,
        pub manager: ChatRoomManager,
        pub registry: Arc<ParticipantRegistry>,
        pub session: ChatSession,
    }

    impl Fixture {
        pub fn new() -> Self {
            let nats = Arc::new(TestNats::new());
            Self::with_publisher(nats.clone(), nats, true)
        }

        pub fn with_publisher(
            publisher: Arc<dyn NatsPublisher>,
            nats: Arc<TestNats>,
            purge_abandoned: bool,
        ) -> Self {
            let store = Arc::new(InMemoryChatStore::new());
            let seller = store.add_member(SELLER, "Sally");
            let buyer = store.add_member(BUYER, "Bob");
            let stranger = store.add_member(STRANGER, "Sam");
            let listing = store.add_listing("Road bike", seller.id);

            let broker = MessageBroker::new(publisher, DEFAULT_CHAT_SUBJECT);
            let manager = ChatRoomManager::new(store.clone(), store.clone());
            let messages = MessageStore::new(store.clone(), store.clone(), store.clone());
            let registry = Arc::new(ParticipantRegistry::new(
                store.clone(),
                store.clone(),
                store.clone(),
                broker.clone(),
                purge_abandoned,
            ));
            let session = ChatSession::new(
                store.clone(),
                store.clone(),
                store.clone(),
                messages,
                registry.clone(),
                broker,
            );

            Self {
                store,
                nats,
                seller,
                buyer,
                stranger,
                listing,
                manager,
                registry,
                session,
            }
        }

        pub async fn open_room(&self) -> crate::common::RoomId {
            self.manager
                .create_or_get_room(self.listing.id, BUYER, None)
                .await
                .unwrap()
        }
    }
}
