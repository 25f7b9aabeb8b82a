//! Review repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ReviewId, UserId};
use domain_review::{Review, ReviewFilter};

use crate::error::{decode, DatabaseError};

const REVIEW_COLUMNS: &str = "id, reviewer_id, reviewee_id, rating, comment, reviewee_role, created_at";

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: ReviewId) -> Result<Review, DatabaseError> {
        let sql = format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS);
        sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Review", id))?
            .try_into()
    }

    pub async fn exists(&self, reviewer: UserId, reviewee: UserId) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE reviewer_id = $1 AND reviewee_id = $2)",
        )
        .bind(reviewer.as_uuid())
        .bind(reviewee.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    /// Reviews matching every side the filter names, newest first
    pub async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM reviews WHERE TRUE", REVIEW_COLUMNS));
        if let Some(reviewer) = filter.reviewer {
            builder.push(" AND reviewer_id = ").push_bind(Uuid::from(reviewer));
        }
        if let Some(reviewee) = filter.reviewee {
            builder.push(" AND reviewee_id = ").push_bind(Uuid::from(reviewee));
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build_query_as::<ReviewRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    pub async fn insert(&self, review: &Review) -> Result<(), DatabaseError> {
        insert_review(&self.pool, review).await
    }

    pub async fn update(&self, review: &Review) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE reviews SET rating = $2, comment = $3, reviewee_role = $4 WHERE id = $1")
            .bind(review.id.as_uuid())
            .bind(review.rating)
            .bind(&review.comment)
            .bind(review.reviewee_role.code())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: ReviewId) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(crate) async fn insert_review<'e, E>(executor: E, review: &Review) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO reviews (id, reviewer_id, reviewee_id, rating, comment, reviewee_role, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(review.id.as_uuid())
    .bind(review.reviewer_id.as_uuid())
    .bind(review.reviewee_id.as_uuid())
    .bind(review.rating)
    .bind(&review.comment)
    .bind(review.reviewee_role.code())
    .bind(review.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewee_role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = DatabaseError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: ReviewId::from_uuid(row.id),
            reviewer_id: UserId::from_uuid(row.reviewer_id),
            reviewee_id: UserId::from_uuid(row.reviewee_id),
            rating: row.rating,
            comment: row.comment,
            reviewee_role: decode(&row.reviewee_role)?,
            created_at: row.created_at,
        })
    }
}
