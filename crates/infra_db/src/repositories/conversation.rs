//! Conversation and message repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{ConversationId, ListingId, MessageId, UserId};
use domain_messaging::{Conversation, Message};

use crate::error::DatabaseError;

const CONVERSATION_SELECT: &str = r#"
    SELECT c.id, c.listing_id, c.last_updated,
           ARRAY(SELECT p.user_id FROM conversation_participants p WHERE p.conversation_id = c.id ORDER BY p.user_id) AS participants
    FROM conversations c
"#;

const MESSAGE_COLUMNS: &str = "m.id, m.conversation_id, m.sender_id, m.content, m.sent_at, m.read";

#[derive(Debug, Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: ConversationId) -> Result<Conversation, DatabaseError> {
        let sql = format!("{} WHERE c.id = $1", CONVERSATION_SELECT);
        let row = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Conversation", id))?;
        Ok(row.into())
    }

    /// The user's conversations, most recently active first
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, DatabaseError> {
        let sql = format!(
            "{} WHERE EXISTS (SELECT 1 FROM conversation_participants p WHERE p.conversation_id = c.id AND p.user_id = $1) ORDER BY c.last_updated DESC",
            CONVERSATION_SELECT
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    /// The user's conversations about one listing
    pub async fn list_for_listing(&self, listing_id: ListingId, user_id: UserId) -> Result<Vec<Conversation>, DatabaseError> {
        let sql = format!(
            "{} WHERE c.listing_id = $1 AND EXISTS (SELECT 1 FROM conversation_participants p WHERE p.conversation_id = c.id AND p.user_id = $2)",
            CONVERSATION_SELECT
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(listing_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    /// Inserts the conversation unless one about the same listing between
    /// the same participants already exists
    ///
    /// A transaction-scoped advisory lock on the listing and participant
    /// set serializes concurrent starts, so the existence check and the
    /// insert cannot interleave. Returns `false` for a duplicate.
    pub async fn insert_unique(&self, conversation: &Conversation) -> Result<bool, DatabaseError> {
        let mut participants: Vec<Uuid> = conversation.participants.iter().map(|p| Uuid::from(*p)).collect();
        participants.sort();
        participants.dedup();
        let lock_key = format!(
            "conversation:{}:{}",
            conversation.listing_id.as_uuid(),
            participants.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM conversations c
                WHERE c.listing_id = $1
                  AND ARRAY(SELECT p.user_id FROM conversation_participants p WHERE p.conversation_id = c.id ORDER BY p.user_id) = $2::uuid[]
            )
            "#,
        )
        .bind(conversation.listing_id.as_uuid())
        .bind(&participants)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Ok(false);
        }

        sqlx::query("INSERT INTO conversations (id, listing_id, last_updated) VALUES ($1, $2, $3)")
            .bind(conversation.id.as_uuid())
            .bind(conversation.listing_id.as_uuid())
            .bind(conversation.last_updated)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(conversation.id.as_uuid())
        .bind(&participants)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        debug!(conversation_id = %conversation.id, "Started conversation");
        Ok(true)
    }

    /// Stores a message and moves the conversation's `last_updated` with it
    pub async fn add_message(&self, conversation: &Conversation, message: &Message) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, content, sent_at, read) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.sender_id.as_uuid())
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(message.read)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE conversations SET last_updated = $2 WHERE id = $1")
            .bind(conversation.id.as_uuid())
            .bind(conversation.last_updated)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Messages in timestamp order
    pub async fn messages(&self, id: ConversationId) -> Result<Vec<Message>, DatabaseError> {
        let sql = format!("SELECT {} FROM messages m WHERE m.conversation_id = $1 ORDER BY m.sent_at, m.id", MESSAGE_COLUMNS);
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    pub async fn mark_read(&self, ids: &[MessageId]) -> Result<(), DatabaseError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
        sqlx::query("UPDATE messages SET read = TRUE WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Unread messages sent to `user_id` by other participants
    pub async fn unread_for(&self, user_id: UserId) -> Result<Vec<Message>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM messages m
            JOIN conversation_participants p ON p.conversation_id = m.conversation_id AND p.user_id = $1
            WHERE m.sender_id <> $1 AND NOT m.read
            ORDER BY m.sent_at DESC
            "#,
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    pub async fn remove_participant(&self, id: ConversationId, user_id: UserId) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: ConversationId) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        debug!(conversation_id = %id, "Deleted conversation");
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub last_updated: DateTime<Utc>,
    pub participants: Vec<Uuid>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: ConversationId::from_uuid(row.id),
            listing_id: ListingId::from_uuid(row.listing_id),
            participants: row.participants.into_iter().map(UserId::from_uuid).collect(),
            last_updated: row.last_updated,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: MessageId::from_uuid(row.id),
            conversation_id: ConversationId::from_uuid(row.conversation_id),
            sender_id: UserId::from_uuid(row.sender_id),
            content: row.content,
            timestamp: row.sent_at,
            read: row.read,
        }
    }
}
