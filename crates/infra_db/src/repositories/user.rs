//! User repository
//!
//! Emails are stored normalized (trimmed, lowercased) and a unique index on
//! `LOWER(email)` backs the "already taken" check.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};
use tracing::debug;
use uuid::Uuid;

use core_kernel::UserId;
use domain_account::User;

use crate::error::{decode, decode_opt, DatabaseError};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, age, sex, city, \
    preferred_location, id_verification_status, budget_min, budget_max, yearly_income, \
    profile_picture, phone_number, phone_verified, email_verified, terms_accepted, \
    receive_email_notifications, receive_sms_notifications, facebook_link, instagram_link, \
    last_login, created_at";

/// Repository for user accounts
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a user by id
    ///
    /// # Returns
    ///
    /// The user or `NotFound`
    pub async fn get(&self, id: UserId) -> Result<User, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn find(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    /// Looks a user up by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    /// Whether another account already uses `email`
    ///
    /// # Arguments
    ///
    /// * `email` - address to check, any case
    /// * `except` - account to ignore, used when a user edits their own profile
    pub async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool, DatabaseError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(except.map(Uuid::from))
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        insert_user(&self.pool, user).await
    }

    /// Writes every mutable column of `user`
    pub async fn update(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2, password_hash = $3, first_name = $4, last_name = $5, age = $6,
                sex = $7, city = $8, preferred_location = $9, id_verification_status = $10,
                budget_min = $11, budget_max = $12, yearly_income = $13, profile_picture = $14,
                phone_number = $15, phone_verified = $16, email_verified = $17,
                receive_email_notifications = $18, receive_sms_notifications = $19,
                facebook_link = $20, instagram_link = $21
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(user.sex.map(|s| s.code()))
        .bind(&user.city)
        .bind(&user.preferred_location)
        .bind(user.id_verification_status.code())
        .bind(user.budget_min)
        .bind(user.budget_max)
        .bind(user.yearly_income)
        .bind(&user.profile_picture)
        .bind(&user.phone_number)
        .bind(user.phone_verified)
        .bind(user.email_verified)
        .bind(user.receive_email_notifications)
        .bind(user.receive_sms_notifications)
        .bind(&user.facebook_link)
        .bind(&user.instagram_link)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", user.id));
        }
        Ok(())
    }

    pub async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_email_verified(&self, id: UserId) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes the account; owned rows go with it through `ON DELETE CASCADE`
    pub async fn delete(&self, id: UserId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }
        debug!(user_id = %id, "Deleted user");
        Ok(())
    }
}

pub(crate) async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO users (
            id, email, password_hash, first_name, last_name, age, sex, city,
            preferred_location, id_verification_status, budget_min, budget_max, yearly_income,
            profile_picture, phone_number, phone_verified, email_verified, terms_accepted,
            receive_email_notifications, receive_sms_notifications, facebook_link, instagram_link,
            last_login, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
            $19, $20, $21, $22, $23, $24
        )
        "#,
    )
    .bind(user.id.as_uuid())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.age)
    .bind(user.sex.map(|s| s.code()))
    .bind(&user.city)
    .bind(&user.preferred_location)
    .bind(user.id_verification_status.code())
    .bind(user.budget_min)
    .bind(user.budget_max)
    .bind(user.yearly_income)
    .bind(&user.profile_picture)
    .bind(&user.phone_number)
    .bind(user.phone_verified)
    .bind(user.email_verified)
    .bind(user.terms_accepted)
    .bind(user.receive_email_notifications)
    .bind(user.receive_sms_notifications)
    .bind(&user.facebook_link)
    .bind(&user.instagram_link)
    .bind(user.last_login)
    .bind(user.created_at)
    .execute(executor)
    .await?;

    debug!(user_id = %user.id, "Inserted user");
    Ok(())
}

/// Database row for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub city: Option<String>,
    pub preferred_location: Option<String>,
    pub id_verification_status: String,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub yearly_income: Option<Decimal>,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub email_verified: bool,
    pub terms_accepted: bool,
    pub receive_email_notifications: bool,
    pub receive_sms_notifications: bool,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            sex: decode_opt(row.sex.as_deref())?,
            city: row.city,
            preferred_location: row.preferred_location,
            id_verification_status: decode(&row.id_verification_status)?,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
            yearly_income: row.yearly_income,
            profile_picture: row.profile_picture,
            phone_number: row.phone_number,
            phone_verified: row.phone_verified,
            email_verified: row.email_verified,
            terms_accepted: row.terms_accepted,
            receive_email_notifications: row.receive_email_notifications,
            receive_sms_notifications: row.receive_sms_notifications,
            facebook_link: row.facebook_link,
            instagram_link: row.instagram_link,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}
