//! Favorites and listing interactions

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{InteractionId, ListingId, UserId};
use domain_listing::{FavoriteToggle, InteractionKind, Listing, ListingInteraction};

use super::listing::{ListingRow, LISTING_COLUMNS};
use crate::error::{decode, DatabaseError};

/// Repository for a user's saved listings
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn is_favorite(&self, user_id: UserId, listing_id: ListingId) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND listing_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(listing_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    /// Adds the listing when absent, removes it when present
    ///
    /// Adding also records a `favourite` interaction in the same transaction.
    pub async fn toggle(&self, user_id: UserId, listing_id: ListingId) -> Result<FavoriteToggle, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id.as_uuid())
            .bind(listing_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let outcome = FavoriteToggle::from_current(removed > 0);

        if outcome.is_favorite() {
            sqlx::query("INSERT INTO favorites (user_id, listing_id) VALUES ($1, $2)")
                .bind(user_id.as_uuid())
                .bind(listing_id.as_uuid())
                .execute(&mut *tx)
                .await?;
            let interaction = ListingInteraction::record(user_id, listing_id, InteractionKind::Favourite);
            insert_interaction(&mut *tx, &interaction).await?;
        }

        tx.commit().await?;
        debug!(user_id = %user_id, listing_id = %listing_id, outcome = ?outcome, "Toggled favorite");
        Ok(outcome)
    }

    /// Saved listings, most recently saved first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Listing>, DatabaseError> {
        let columns = LISTING_COLUMNS
            .split(", ")
            .map(|c| format!("l.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM favorites f JOIN listings l ON l.id = f.listing_id WHERE f.user_id = $1 ORDER BY f.created_at DESC",
            columns
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Listing::try_from).collect()
    }
}

/// Repository for click/favourite events feeding the recommender
#[derive(Debug, Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

impl InteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, interaction: &ListingInteraction) -> Result<(), DatabaseError> {
        insert_interaction(&self.pool, interaction).await
    }

    pub async fn list_all(&self) -> Result<Vec<ListingInteraction>, DatabaseError> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            "SELECT id, user_id, listing_id, kind, occurred_at FROM listing_interactions ORDER BY occurred_at",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ListingInteraction::try_from).collect()
    }
}

pub(crate) async fn insert_interaction<'e, E>(executor: E, interaction: &ListingInteraction) -> Result<(), DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO listing_interactions (id, user_id, listing_id, kind, occurred_at) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(interaction.id.as_uuid())
    .bind(interaction.user_id.as_uuid())
    .bind(interaction.listing_id.as_uuid())
    .bind(interaction.kind.code())
    .bind(interaction.timestamp)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub kind: String,
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for ListingInteraction {
    type Error = DatabaseError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        Ok(ListingInteraction {
            id: InteractionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            listing_id: ListingId::from_uuid(row.listing_id),
            kind: decode(&row.kind)?,
            timestamp: row.occurred_at,
        })
    }
}
