pub mod chat_room;
pub mod message;
pub mod participant;

pub use chat_room::ChatRoom;
pub use message::ChatMessage;
pub use participant::RoomParticipant;
