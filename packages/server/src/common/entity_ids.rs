//! Typed ids for every entity the chat subsystem touches.

pub use super::id::Id;

/// A registered user. Owned by the membership system.
pub struct Member;

/// A marketplace listing. Owned by the listings system.
pub struct Listing;

pub struct ChatRoom;

pub struct RoomParticipant;

pub struct ChatMessage;

pub type MemberId = Id<Member>;
pub type ListingId = Id<Listing>;
pub type RoomId = Id<ChatRoom>;
pub type ParticipantId = Id<RoomParticipant>;
pub type MessageId = Id<ChatMessage>;
