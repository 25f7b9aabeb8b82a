//! Group and invitation repositories
//!
//! A group row plus its `group_members` rows make up one [`Group`].
//! Membership changes are written row by row under the group's row lock,
//! never by replacing the whole member set from an earlier read.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use core_kernel::{GroupId, InvitationId, ListingId, RoommateId, UserId};
use domain_group::{Group, GroupInvitation, GroupMember, GroupStatus};

use crate::error::{decode, DatabaseError};

const GROUP_COLUMNS: &str =
    "g.id, g.name, g.listing_id, g.owner_id, g.description, g.move_in_date, g.move_in_ready, g.group_status, g.created_at";

/// Repository for groups and their membership
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: GroupId) -> Result<Group, DatabaseError> {
        let sql = format!("SELECT {} FROM groups g WHERE g.id = $1", GROUP_COLUMNS);
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows)
            .await?
            .pop()
            .ok_or_else(|| DatabaseError::not_found("Group", id))
    }

    /// Groups applying to one listing, oldest first
    pub async fn list_for_listing(&self, listing_id: ListingId) -> Result<Vec<Group>, DatabaseError> {
        let sql = format!("SELECT {} FROM groups g WHERE g.listing_id = $1 ORDER BY g.created_at", GROUP_COLUMNS);
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(listing_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Groups the roommate owns or belongs to
    pub async fn list_for_roommate(&self, roommate_id: RoommateId) -> Result<Vec<Group>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM groups g
            WHERE g.owner_id = $1
               OR EXISTS (SELECT 1 FROM group_members m WHERE m.group_id = g.id AND m.roommate_id = $1)
            ORDER BY g.created_at DESC
            "#,
            GROUP_COLUMNS
        );
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(roommate_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Groups on any listing owned by `landlord`
    pub async fn list_for_landlord(&self, landlord: UserId) -> Result<Vec<Group>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM groups g JOIN listings l ON l.id = g.listing_id WHERE l.owner_id = $1 ORDER BY g.created_at DESC",
            GROUP_COLUMNS
        );
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(landlord.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    pub async fn insert(&self, group: &Group) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        insert_group(&mut tx, group).await?;
        tx.commit().await?;

        info!(group_id = %group.id, listing_id = %group.listing_id, "Created group");
        Ok(())
    }

    /// Applies `change` to a freshly locked copy of the group and writes
    /// back only what changed
    ///
    /// Joins, leaves and edits of the same group queue on the row lock, so
    /// none of them undoes another. A group left without members is
    /// deleted. When `change` fails nothing is written.
    pub async fn modify<T, E, F>(&self, id: GroupId, change: F) -> Result<(Group, T), E>
    where
        F: FnOnce(&mut Group) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let before = lock_group(&mut tx, id).await?;
        let mut group = before.clone();
        let outcome = change(&mut group)?;

        if group.members.is_empty() {
            sqlx::query("DELETE FROM groups WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::from)?;
            debug!(group_id = %id, "Deleted group with no members left");
        } else {
            update_group(&mut tx, &group).await?;
            write_member_changes(&mut tx, &before, &group).await?;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok((group, outcome))
    }

    /// Stores a landlord's status decision for `group`
    ///
    /// With `reject_siblings` every other group on the listing moves to
    /// `R` in the same transaction. The listing row is locked first, which
    /// holds back groups being created on it until the decision commits.
    /// Returns the number of groups rejected.
    pub async fn set_landlord_status(&self, group: &Group, reject_siblings: bool) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
            .bind(group.listing_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Listing", group.listing_id))?;

        let updated = sqlx::query("UPDATE groups SET group_status = $2 WHERE id = $1")
            .bind(group.id.as_uuid())
            .bind(group.group_status.code())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Group", group.id));
        }

        let rejected = if reject_siblings {
            sqlx::query(
                "UPDATE groups SET group_status = $1 WHERE listing_id = $2 AND id <> $3 AND group_status <> $1",
            )
            .bind(GroupStatus::Rejected.code())
            .bind(group.listing_id.as_uuid())
            .bind(group.id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            0
        };

        tx.commit().await?;
        info!(group_id = %group.id, status = %group.group_status, rejected, "Saved landlord decision");
        Ok(rejected)
    }

    pub async fn delete(&self, id: GroupId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Group", id));
        }
        debug!(group_id = %id, "Deleted group");
        Ok(())
    }

    async fn hydrate(&self, rows: Vec<GroupRow>) -> Result<Vec<Group>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut members = load_members(&self.pool, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let group_members = members.remove(&row.id).unwrap_or_default();
                row.into_group(group_members)
            })
            .collect()
    }
}

async fn load_members<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<GroupMember>>, DatabaseError> {
    let member_rows = sqlx::query_as::<_, MemberRow>(
        "SELECT group_id, roommate_id, joined_at FROM group_members WHERE group_id = ANY($1) ORDER BY joined_at",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    let mut members: HashMap<Uuid, Vec<GroupMember>> = HashMap::new();
    for row in member_rows {
        members.entry(row.group_id).or_default().push(GroupMember {
            roommate_id: RoommateId::from_uuid(row.roommate_id),
            joined_at: row.joined_at,
        });
    }
    Ok(members)
}

/// Reads the group on `conn`, holding its row lock until the transaction ends
async fn lock_group(conn: &mut PgConnection, id: GroupId) -> Result<Group, DatabaseError> {
    let sql = format!("SELECT {} FROM groups g WHERE g.id = $1 FOR UPDATE", GROUP_COLUMNS);
    let row = sqlx::query_as::<_, GroupRow>(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Group", id))?;
    let mut members = load_members(&mut *conn, &[row.id]).await?;
    let group_members = members.remove(&row.id).unwrap_or_default();
    row.into_group(group_members)
}

/// Inserts the group row and its members on `conn`
pub(crate) async fn insert_group(conn: &mut PgConnection, group: &Group) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO groups (id, name, listing_id, owner_id, description, move_in_date, move_in_ready, group_status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(group.id.as_uuid())
    .bind(&group.name)
    .bind(group.listing_id.as_uuid())
    .bind(group.owner_id.as_uuid())
    .bind(&group.description)
    .bind(group.move_in_date)
    .bind(group.move_in_ready)
    .bind(group.group_status.code())
    .bind(group.created_at)
    .execute(&mut *conn)
    .await?;
    for member in &group.members {
        insert_member(&mut *conn, group.id, member).await?;
    }
    Ok(())
}

async fn update_group(conn: &mut PgConnection, group: &Group) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE groups SET
            name = $2, owner_id = $3, description = $4, move_in_date = $5,
            move_in_ready = $6, group_status = $7
        WHERE id = $1
        "#,
    )
    .bind(group.id.as_uuid())
    .bind(&group.name)
    .bind(group.owner_id.as_uuid())
    .bind(&group.description)
    .bind(group.move_in_date)
    .bind(group.move_in_ready)
    .bind(group.group_status.code())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Group", group.id));
    }
    Ok(())
}

/// Adds one membership row; an existing row for the pair is left alone
async fn insert_member<'e, E: PgExecutor<'e>>(
    executor: E,
    group_id: GroupId,
    member: &GroupMember,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO group_members (group_id, roommate_id, joined_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, roommate_id) DO NOTHING
        "#,
    )
    .bind(group_id.as_uuid())
    .bind(member.roommate_id.as_uuid())
    .bind(member.joined_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Writes the membership rows that differ between `before` and `after`
async fn write_member_changes(conn: &mut PgConnection, before: &Group, after: &Group) -> Result<(), DatabaseError> {
    for member in after.members.iter().filter(|m| !before.is_member(m.roommate_id)) {
        insert_member(&mut *conn, after.id, member).await?;
    }
    for member in before.members.iter().filter(|m| !after.is_member(m.roommate_id)) {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND roommate_id = $2")
            .bind(after.id.as_uuid())
            .bind(member.roommate_id.as_uuid())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Database row for a group, without members
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub name: String,
    pub listing_id: Uuid,
    pub owner_id: Uuid,
    pub description: Option<String>,
    pub move_in_date: NaiveDate,
    pub move_in_ready: bool,
    pub group_status: String,
    pub created_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, members: Vec<GroupMember>) -> Result<Group, DatabaseError> {
        Ok(Group {
            id: GroupId::from_uuid(self.id),
            name: self.name,
            listing_id: ListingId::from_uuid(self.listing_id),
            owner_id: RoommateId::from_uuid(self.owner_id),
            members,
            description: self.description,
            move_in_date: self.move_in_date,
            move_in_ready: self.move_in_ready,
            group_status: decode(&self.group_status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct MemberRow {
    group_id: Uuid,
    roommate_id: Uuid,
    joined_at: DateTime<Utc>,
}

const INVITATION_COLUMNS: &str = "id, group_id, invited_user, invited_by, status, created_at";

/// Repository for group invitations
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: InvitationId) -> Result<GroupInvitation, DatabaseError> {
        let sql = format!("SELECT {} FROM group_invitations WHERE id = $1", INVITATION_COLUMNS);
        sqlx::query_as::<_, InvitationRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("GroupInvitation", id))?
            .try_into()
    }

    pub async fn exists(&self, group_id: GroupId, invitee: RoommateId) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM group_invitations WHERE group_id = $1 AND invited_user = $2)",
        )
        .bind(group_id.as_uuid())
        .bind(invitee.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    /// Whether the roommate holds an accepted invitation to the group
    pub async fn has_accepted(&self, group_id: GroupId, invitee: RoommateId) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM group_invitations WHERE group_id = $1 AND invited_user = $2 AND status = 'accepted')",
        )
        .bind(group_id.as_uuid())
        .bind(invitee.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn received(&self, roommate_id: RoommateId) -> Result<Vec<GroupInvitation>, DatabaseError> {
        self.list_by("invited_user", roommate_id).await
    }

    pub async fn sent(&self, roommate_id: RoommateId) -> Result<Vec<GroupInvitation>, DatabaseError> {
        self.list_by("invited_by", roommate_id).await
    }

    async fn list_by(&self, column: &'static str, roommate_id: RoommateId) -> Result<Vec<GroupInvitation>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM group_invitations WHERE {} = $1 ORDER BY created_at DESC",
            INVITATION_COLUMNS, column
        );
        let rows = sqlx::query_as::<_, InvitationRow>(&sql)
            .bind(roommate_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(GroupInvitation::try_from).collect()
    }

    /// Inserts an invitation
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when the pair was already invited concurrently
    pub async fn insert(&self, invitation: &GroupInvitation) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO group_invitations (id, group_id, invited_user, invited_by, status, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(invitation.id.as_uuid())
        .bind(invitation.group_id.as_uuid())
        .bind(invitation.invited_user.as_uuid())
        .bind(invitation.invited_by.as_uuid())
        .bind(invitation.status.code())
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await?;
        debug!(invitation_id = %invitation.id, group_id = %invitation.group_id, "Created invitation");
        Ok(())
    }

    /// Stores the invitee's answer; an acceptance adds that one
    /// membership row in the same transaction
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` when the invitation was answered concurrently
    pub async fn save_response(&self, invitation: &GroupInvitation) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let answered = sqlx::query("UPDATE group_invitations SET status = $2 WHERE id = $1 AND status = 'pending'")
            .bind(invitation.id.as_uuid())
            .bind(invitation.status.code())
            .execute(&mut *tx)
            .await?;
        if answered.rows_affected() == 0 {
            return Err(DatabaseError::ConstraintViolation(
                "This invitation has already been answered.".to_string(),
            ));
        }

        if invitation.is_accepted() {
            let member = GroupMember { roommate_id: invitation.invited_user, joined_at: Utc::now() };
            insert_member(&mut *tx, invitation.group_id, &member).await?;
        }
        tx.commit().await?;
        info!(invitation_id = %invitation.id, status = %invitation.status, "Invitation answered");
        Ok(())
    }

    pub async fn delete(&self, id: InvitationId) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM group_invitations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Database row for an invitation
#[derive(Debug, Clone, FromRow)]
pub struct InvitationRow {
    pub id: Uuid,
    pub group_id: Uuid,
    pub invited_user: Uuid,
    pub invited_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for GroupInvitation {
    type Error = DatabaseError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        Ok(GroupInvitation {
            id: InvitationId::from_uuid(row.id),
            group_id: GroupId::from_uuid(row.group_id),
            invited_user: RoommateId::from_uuid(row.invited_user),
            invited_by: RoommateId::from_uuid(row.invited_by),
            status: decode(&row.status)?,
            created_at: row.created_at,
        })
    }
}
