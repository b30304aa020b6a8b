//! Chatrooms domain - negotiation rooms between a listing author and an
//! interested member.

pub mod activities;
pub mod broker;
pub mod data;
pub mod error;
pub mod models;

pub use activities::{ChatRoomManager, ChatSession, MessageStore, ParticipantRegistry};
pub use broker::{room_topic, MessageBroker};
pub use data::{MessageDto, MessageType, RoomSummary};
pub use error::{ChatError, Entity};
