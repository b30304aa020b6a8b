use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::RoomParticipant;
use crate::common::{ListingId, MemberId, RoomId};

/// ChatRoom - a negotiation room for one (listing, initiator) pair
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub listing_id: ListingId,
    pub initiator_id: MemberId,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub async fn find_by_id(id: RoomId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM chat_rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find the room a member opened about a listing
    pub async fn find_by_listing_and_initiator(
        listing_id: ListingId,
        initiator_id: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM chat_rooms WHERE listing_id = $1 AND initiator_id = $2",
        )
        .bind(listing_id)
        .bind(initiator_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert the room and an ACTIVE participant row per member in one transaction.
    ///
    /// Returns `None` when another room already holds the (listing, initiator)
    /// key; nothing is written in that case.
    pub async fn create_with_participants(
        listing_id: ListingId,
        initiator_id: MemberId,
        room_name: &str,
        members: [MemberId; 2],
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let room = sqlx::query_as::<_, Self>(
            "INSERT INTO chat_rooms (id, listing_id, initiator_id, room_name)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (listing_id, initiator_id) DO NOTHING
             RETURNING *",
        )
        .bind(RoomId::new())
        .bind(listing_id)
        .bind(initiator_id)
        .bind(room_name)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(room) = room else {
            tx.rollback().await?;
            return Ok(None);
        };

        for member_id in members {
            RoomParticipant::insert_active(room.id, member_id, &mut tx).await?;
        }

        tx.commit().await?;
        Ok(Some(room))
    }

    /// Delete a room; participants and messages cascade
    pub async fn delete(id: RoomId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
