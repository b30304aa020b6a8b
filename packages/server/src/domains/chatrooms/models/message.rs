use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MemberId, MessageId, RoomId};

/// ChatMessage - append-only message in a room
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: MemberId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub async fn insert(
        room_id: RoomId,
        sender_id: MemberId,
        content: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO chat_messages (id, room_id, sender_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(MessageId::new())
        .bind(room_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Messages of a room, oldest first
    pub async fn find_by_room(room_id: RoomId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM chat_messages WHERE room_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_latest_by_room(room_id: RoomId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM chat_messages
             WHERE room_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(room_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
