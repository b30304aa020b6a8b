use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ListingId, MemberId};

/// Listing model - the item a negotiation room is about
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub author_id: MemberId,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub async fn find_by_id(id: ListingId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert a listing (fixtures and seeding)
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO listings (id, title, author_id, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(self.author_id)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
