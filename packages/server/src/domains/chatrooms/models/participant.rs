use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::common::{MemberId, ParticipantId, RoomId};

/// RoomParticipant - one membership episode of a member in a room
///
/// Rows start ACTIVE (`is_active = true`, `left_at = NULL`) and move to LEFT
/// exactly once. A LEFT row is never reactivated.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct RoomParticipant {
    pub id: ParticipantId,
    pub room_id: RoomId,
    pub member_id: MemberId,
    pub is_active: bool,
    pub left_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RoomParticipant {
    pub async fn insert_active(
        room_id: RoomId,
        member_id: MemberId,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO room_participants (id, room_id, member_id, is_active)
             VALUES ($1, $2, $3, TRUE)
             RETURNING *",
        )
        .bind(ParticipantId::new())
        .bind(room_id)
        .bind(member_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }

    pub async fn find_active(
        room_id: RoomId,
        member_id: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM room_participants
             WHERE room_id = $1 AND member_id = $2 AND is_active",
        )
        .bind(room_id)
        .bind(member_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// ACTIVE -> LEFT. Returns `None` if the row was no longer ACTIVE.
    pub async fn mark_left(id: ParticipantId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE room_participants
             SET is_active = FALSE, left_at = GREATEST(clock_timestamp(), created_at)
             WHERE id = $1 AND is_active
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn has_active(room_id: RoomId, pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM room_participants WHERE room_id = $1 AND is_active)",
        )
        .bind(room_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// ACTIVE memberships of a member, most recently joined first
    pub async fn find_active_for_member(member_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM room_participants
             WHERE member_id = $1 AND is_active
             ORDER BY created_at DESC, id DESC",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_room(room_id: RoomId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM room_participants WHERE room_id = $1 ORDER BY created_at, id",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
