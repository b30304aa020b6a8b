//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod nats;
pub mod pg_store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ChatStores, ServerDeps};
pub use nats::{NatsClientPublisher, NatsPublisher, PublishedMessage, TestNats};
pub use pg_store::PgChatStore;
pub use stream_hub::StreamHub;
pub use test_dependencies::{FailingNats, InMemoryChatStore};
pub use traits::*;
