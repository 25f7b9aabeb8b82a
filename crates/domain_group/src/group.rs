//! Group aggregate and status rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{define_code_enum, FieldErrors, GroupId, ListingId, RoommateId};

use crate::error::GroupError;

define_code_enum!(
    GroupStatus {
        Open => "O",
        Private => "P",
        Filled => "F",
        Sent => "S",
        UnderReview => "U",
        Rejected => "R",
        Invited => "I",
    }
);

impl GroupStatus {
    /// Statuses a group owner or member may set
    pub const TENANT_SETTABLE: [GroupStatus; 4] = [
        GroupStatus::Open,
        GroupStatus::Private,
        GroupStatus::Filled,
        GroupStatus::Sent,
    ];

    /// Statuses the listing's landlord may set
    pub const LANDLORD_SETTABLE: [GroupStatus; 3] = [
        GroupStatus::UnderReview,
        GroupStatus::Invited,
        GroupStatus::Rejected,
    ];

    pub fn is_tenant_settable(&self) -> bool {
        Self::TENANT_SETTABLE.contains(self)
    }

    pub fn is_landlord_settable(&self) -> bool {
        Self::LANDLORD_SETTABLE.contains(self)
    }

    fn codes(statuses: &[GroupStatus]) -> String {
        let codes: Vec<&str> = statuses.iter().map(|s| s.code()).collect();
        match codes.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
            _ => codes.join(""),
        }
    }

    pub fn tenant_error() -> GroupError {
        GroupError::InvalidStatus(format!(
            "You can only set status to {}.",
            Self::codes(&Self::TENANT_SETTABLE)
        ))
    }

    pub fn landlord_error() -> GroupError {
        GroupError::InvalidStatus(format!(
            "Landlords can only set status to {}.",
            Self::codes(&Self::LANDLORD_SETTABLE)
        ))
    }

    /// Parses a status code sent by a tenant
    pub fn parse_for_tenant(code: &str) -> Result<GroupStatus, GroupError> {
        code.parse::<GroupStatus>()
            .ok()
            .filter(GroupStatus::is_tenant_settable)
            .ok_or_else(Self::tenant_error)
    }

    /// Parses a status code sent by a landlord
    pub fn parse_for_landlord(code: &str) -> Result<GroupStatus, GroupError> {
        code.parse::<GroupStatus>()
            .ok()
            .filter(GroupStatus::is_landlord_settable)
            .ok_or_else(Self::landlord_error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub roommate_id: RoommateId,
    pub joined_at: DateTime<Utc>,
}

/// Roommates applying together for one listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub listing_id: ListingId,
    pub owner_id: RoommateId,
    /// Ordered by join time, oldest first
    pub members: Vec<GroupMember>,
    pub description: Option<String>,
    pub move_in_date: NaiveDate,
    pub move_in_ready: bool,
    pub group_status: GroupStatus,
    pub created_at: DateTime<Utc>,
}

/// What happened to a group when a member left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    /// The owner left and the oldest remaining member took over
    OwnershipTransferred(RoommateId),
    /// Nobody is left, the group should be deleted
    Disbanded,
}

impl Group {
    pub fn is_member(&self, roommate_id: RoommateId) -> bool {
        self.members.iter().any(|m| m.roommate_id == roommate_id)
    }

    /// Owner or member
    pub fn involves(&self, roommate_id: RoommateId) -> bool {
        self.owner_id == roommate_id || self.is_member(roommate_id)
    }

    pub fn member_ids(&self) -> Vec<RoommateId> {
        self.members.iter().map(|m| m.roommate_id).collect()
    }

    /// Status change requested by the group owner or a member
    pub fn set_status_as_tenant(&mut self, status: GroupStatus) -> Result<(), GroupError> {
        if !status.is_tenant_settable() {
            return Err(GroupStatus::tenant_error());
        }
        self.group_status = status;
        Ok(())
    }

    /// Status change requested by the listing's landlord
    ///
    /// Returns `true` when the change is an invitation, in which case every
    /// other group on the same listing must move to `R` in the same
    /// transaction.
    pub fn set_status_as_landlord(&mut self, status: GroupStatus) -> Result<bool, GroupError> {
        if !status.is_landlord_settable() {
            return Err(GroupStatus::landlord_error());
        }
        self.group_status = status;
        Ok(status == GroupStatus::Invited)
    }

    /// Adds `roommate_id` as a member
    ///
    /// Private groups need an accepted invitation. Filled, rejected and
    /// invited groups accept nobody.
    pub fn join(&mut self, roommate_id: RoommateId, has_accepted_invitation: bool) -> Result<(), GroupError> {
        if self.is_member(roommate_id) {
            return Err(GroupError::AlreadyMember);
        }
        let accepting = match self.group_status {
            GroupStatus::Filled | GroupStatus::Rejected | GroupStatus::Invited => false,
            GroupStatus::Private => has_accepted_invitation,
            GroupStatus::Open | GroupStatus::Sent | GroupStatus::UnderReview => true,
        };
        if !accepting {
            return Err(GroupError::NotAccepting);
        }
        self.add_member(roommate_id);
        Ok(())
    }

    /// Adds a member without the status checks, used when an invitation is accepted
    pub(crate) fn add_member(&mut self, roommate_id: RoommateId) {
        if !self.is_member(roommate_id) {
            self.members.push(GroupMember { roommate_id, joined_at: Utc::now() });
        }
    }

    pub fn leave(&mut self, roommate_id: RoommateId) -> Result<LeaveOutcome, GroupError> {
        if !self.is_member(roommate_id) {
            return Err(GroupError::NotMember);
        }
        self.members.retain(|m| m.roommate_id != roommate_id);

        if self.owner_id != roommate_id {
            return Ok(LeaveOutcome::Left);
        }
        match self.members.iter().min_by_key(|m| m.joined_at) {
            Some(oldest) => {
                self.owner_id = oldest.roommate_id;
                Ok(LeaveOutcome::OwnershipTransferred(oldest.roommate_id))
            }
            None => Ok(LeaveOutcome::Disbanded),
        }
    }
}

/// Payload for creating a group on a listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub move_in_ready: bool,
    pub group_status: Option<String>,
}

impl GroupDraft {
    pub fn validate(self, listing_id: ListingId, owner_id: RoommateId) -> Result<Group, GroupError> {
        let mut errors = FieldErrors::new();

        let name = self.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            errors.required("name");
        }
        if self.move_in_date.is_none() {
            errors.required("move_in_date");
        }
        let status = match self.group_status.as_deref() {
            None => Some(GroupStatus::Open),
            Some(code) => match GroupStatus::parse_for_tenant(code) {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.add("group_status", e.to_string());
                    None
                }
            },
        };

        let (Some(move_in_date), Some(group_status), true) =
            (self.move_in_date, status, errors.is_empty())
        else {
            return Err(errors.into());
        };

        let now = Utc::now();
        Ok(Group {
            id: GroupId::new_v7(),
            name,
            listing_id,
            owner_id,
            members: vec![GroupMember { roommate_id: owner_id, joined_at: now }],
            description: self.description,
            move_in_date,
            move_in_ready: self.move_in_ready,
            group_status,
            created_at: now,
        })
    }
}

/// Tenant edit of a group
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub move_in_ready: Option<bool>,
    pub group_status: Option<String>,
}

impl GroupPatch {
    /// Applies the edit; the status must be one a tenant may set
    pub fn apply(self, group: &mut Group) -> Result<(), GroupError> {
        let status = self
            .group_status
            .as_deref()
            .map(GroupStatus::parse_for_tenant)
            .transpose()?;

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(FieldErrors::single("name", "This field may not be blank.").into());
            }
        }

        if let Some(status) = status {
            group.set_status_as_tenant(status)?;
        }
        if let Some(name) = self.name {
            group.name = name.trim().to_string();
        }
        if self.description.is_some() {
            group.description = self.description;
        }
        if let Some(date) = self.move_in_date {
            group.move_in_date = date;
        }
        if let Some(ready) = self.move_in_ready {
            group.move_in_ready = ready;
        }
        Ok(())
    }
}
