//! Server dependencies (using traits for testability)
//!
//! Builds the chat components from a storage backend and a broker transport.
//! Production wires `PgChatStore` + NATS or loopback; tests wire
//! `InMemoryChatStore` + `TestNats`.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::JwtService;
use crate::domains::chatrooms::{
    ChatRoomManager, ChatSession, MessageBroker, MessageStore, ParticipantRegistry,
};
use crate::kernel::{
    stream_hub::StreamHub, BaseDirectory, BaseMessageStore, BaseParticipantStore, BaseRoomStore,
    NatsPublisher,
};

/// The storage seams the chat components are built from
#[derive(Clone)]
pub struct ChatStores {
    pub rooms: Arc<dyn BaseRoomStore>,
    pub participants: Arc<dyn BaseParticipantStore>,
    pub messages: Arc<dyn BaseMessageStore>,
    pub directory: Arc<dyn BaseDirectory>,
}

impl ChatStores {
    /// Use one backend for every seam.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: BaseRoomStore + BaseParticipantStore + BaseMessageStore + BaseDirectory + 'static,
    {
        Self {
            rooms: backend.clone(),
            participants: backend.clone(),
            messages: backend.clone(),
            directory: backend,
        }
    }
}

/// Server dependencies shared by all routes
#[derive(Clone)]
pub struct ServerDeps {
    /// `None` when running on the in-memory backend
    pub db_pool: Option<PgPool>,
    pub room_manager: Arc<ChatRoomManager>,
    pub participants: Arc<ParticipantRegistry>,
    pub session: Arc<ChatSession>,
    pub broker: MessageBroker,
    /// In-process pub/sub hub for real-time streaming to SSE endpoints
    pub stream_hub: StreamHub,
    pub jwt_service: Arc<JwtService>,
}

impl ServerDeps {
    pub fn new(
        db_pool: Option<PgPool>,
        stores: ChatStores,
        publisher: Arc<dyn NatsPublisher>,
        chat_subject: &str,
        purge_abandoned_rooms: bool,
        stream_hub: StreamHub,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        let broker = MessageBroker::new(publisher, chat_subject);

        let room_manager = Arc::new(ChatRoomManager::new(
            stores.rooms.clone(),
            stores.directory.clone(),
        ));
        let participants = Arc::new(ParticipantRegistry::new(
            stores.participants.clone(),
            stores.rooms.clone(),
            stores.directory.clone(),
            broker.clone(),
            purge_abandoned_rooms,
        ));
        let message_store = MessageStore::new(
            stores.messages.clone(),
            stores.rooms.clone(),
            stores.directory.clone(),
        );
        let session = Arc::new(ChatSession::new(
            stores.rooms,
            stores.participants,
            stores.directory,
            message_store,
            participants.clone(),
            broker.clone(),
        ));

        Self {
            db_pool,
            room_manager,
            participants,
            session,
            broker,
            stream_hub,
            jwt_service,
        }
    }
}
