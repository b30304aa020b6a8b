//! Wire types for chat messages and room summaries.

use serde::{Deserialize, Serialize};

use super::models::ChatMessage;
use crate::common::{ListingId, MemberId, RoomId};
use crate::domains::member::Member;

pub const SYSTEM_SENDER_NAME: &str = "System";
pub const SYSTEM_SENDER_EMAIL: &str = "system@dealroom.local";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Normal,
    LeaveNotification,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Normal => "NORMAL",
            MessageType::LeaveNotification => "LEAVE_NOTIFICATION",
            MessageType::Error => "ERROR",
        }
    }
}

/// A message as shown to clients and as carried on the broker channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(default)]
    pub sender_name: String,
    pub content: String,
    pub sender_id: MemberId,
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
}

impl MessageDto {
    pub fn from_message(message: &ChatMessage, sender: &Member) -> Self {
        Self {
            sender_name: sender.name.clone(),
            content: message.content.clone(),
            sender_id: message.sender_id,
            room_id: message.room_id,
            sender_email: Some(sender.email.clone()),
            message_type: MessageType::Normal,
        }
    }

    /// A notice attributed to the system sender (nil member id).
    pub fn system_notice(room_id: RoomId, content: String, message_type: MessageType) -> Self {
        Self {
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            content,
            sender_id: MemberId::nil(),
            room_id,
            sender_email: Some(SYSTEM_SENDER_EMAIL.to_string()),
            message_type,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id.is_nil()
    }
}

/// One entry of "my rooms"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_name: String,
    pub listing_id: ListingId,
    pub last_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub room_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}
