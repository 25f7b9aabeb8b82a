//! Roommate profile repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use core_kernel::{RoommateId, UserId};
use domain_account::RoommateProfile;

use crate::error::{decode_opt, DatabaseError};

const ROOMMATE_COLUMNS: &str = "id, user_id, description, move_in_date, stay_length, occupation, \
    roommate_budget, smoke_friendly, cannabis_friendly, pet_friendly, couple_friendly, \
    gender_preference, open_to_message, created_at";

/// Repository for roommate profiles, at most one per user
#[derive(Debug, Clone)]
pub struct RoommateRepository {
    pool: PgPool,
}

impl RoommateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: RoommateId) -> Result<RoommateProfile, DatabaseError> {
        let sql = format!("SELECT {} FROM roommate_profiles WHERE id = $1", ROOMMATE_COLUMNS);
        sqlx::query_as::<_, RoommateRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("RoommateProfile", id))?
            .try_into()
    }

    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<RoommateProfile>, DatabaseError> {
        let sql = format!("SELECT {} FROM roommate_profiles WHERE user_id = $1", ROOMMATE_COLUMNS);
        let row = sqlx::query_as::<_, RoommateRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(RoommateProfile::try_from).transpose()
    }

    /// All profiles except the caller's, newest first
    ///
    /// Filtering by preferences happens in memory on the result.
    pub async fn list_excluding(&self, user_id: Option<UserId>) -> Result<Vec<RoommateProfile>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM roommate_profiles WHERE ($1::uuid IS NULL OR user_id <> $1) ORDER BY created_at DESC",
            ROOMMATE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RoommateRow>(&sql)
            .bind(user_id.map(Uuid::from))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RoommateProfile::try_from).collect()
    }

    /// Inserts a profile
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when the user already has one
    pub async fn insert(&self, profile: &RoommateProfile) -> Result<(), DatabaseError> {
        insert_roommate(&self.pool, profile).await
    }

    pub async fn update(&self, profile: &RoommateProfile) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE roommate_profiles SET
                description = $2, move_in_date = $3, stay_length = $4, occupation = $5,
                roommate_budget = $6, smoke_friendly = $7, cannabis_friendly = $8,
                pet_friendly = $9, couple_friendly = $10, gender_preference = $11,
                open_to_message = $12
            WHERE id = $1
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.description)
        .bind(profile.move_in_date)
        .bind(profile.stay_length)
        .bind(profile.occupation.map(|o| o.code()))
        .bind(profile.roommate_budget)
        .bind(profile.smoke_friendly)
        .bind(profile.cannabis_friendly)
        .bind(profile.pet_friendly)
        .bind(profile.couple_friendly)
        .bind(profile.gender_preference.map(|g| g.code()))
        .bind(profile.open_to_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub(crate) async fn insert_roommate<'e, E>(executor: E, profile: &RoommateProfile) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO roommate_profiles (
            id, user_id, description, move_in_date, stay_length, occupation, roommate_budget,
            smoke_friendly, cannabis_friendly, pet_friendly, couple_friendly,
            gender_preference, open_to_message, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(profile.id.as_uuid())
    .bind(profile.user_id.as_uuid())
    .bind(&profile.description)
    .bind(profile.move_in_date)
    .bind(profile.stay_length)
    .bind(profile.occupation.map(|o| o.code()))
    .bind(profile.roommate_budget)
    .bind(profile.smoke_friendly)
    .bind(profile.cannabis_friendly)
    .bind(profile.pet_friendly)
    .bind(profile.couple_friendly)
    .bind(profile.gender_preference.map(|g| g.code()))
    .bind(profile.open_to_message)
    .bind(profile.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Database row for a roommate profile
#[derive(Debug, Clone, FromRow)]
pub struct RoommateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub move_in_date: Option<NaiveDate>,
    pub stay_length: Option<i32>,
    pub occupation: Option<String>,
    pub roommate_budget: Option<Decimal>,
    pub smoke_friendly: bool,
    pub cannabis_friendly: bool,
    pub pet_friendly: bool,
    pub couple_friendly: bool,
    pub gender_preference: Option<String>,
    pub open_to_message: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RoommateRow> for RoommateProfile {
    type Error = DatabaseError;

    fn try_from(row: RoommateRow) -> Result<Self, Self::Error> {
        Ok(RoommateProfile {
            id: RoommateId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            description: row.description,
            move_in_date: row.move_in_date,
            stay_length: row.stay_length,
            occupation: decode_opt(row.occupation.as_deref())?,
            roommate_budget: row.roommate_budget,
            smoke_friendly: row.smoke_friendly,
            cannabis_friendly: row.cannabis_friendly,
            pet_friendly: row.pet_friendly,
            couple_friendly: row.couple_friendly,
            gender_preference: decode_opt(row.gender_preference.as_deref())?,
            open_to_message: row.open_to_message,
            created_at: row.created_at,
        })
    }
}
