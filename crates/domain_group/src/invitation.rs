//! Group invitations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{define_code_enum, GroupId, InvitationId, RoommateId};

use crate::error::GroupError;
use crate::group::Group;

define_code_enum!(
    InvitationStatus {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInvitation {
    pub id: InvitationId,
    pub group_id: GroupId,
    pub invited_user: RoommateId,
    pub invited_by: RoommateId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

impl GroupInvitation {
    /// Creates an invitation to `group`
    ///
    /// # Arguments
    ///
    /// * `invitee_owns_listing` - whether the invitee's user owns the group's listing
    /// * `already_invited` - whether an invitation for this pair already exists
    pub fn create(
        group: &Group,
        inviter: RoommateId,
        invitee: RoommateId,
        invitee_owns_listing: bool,
        already_invited: bool,
    ) -> Result<Self, GroupError> {
        if invitee_owns_listing {
            return Err(GroupError::ListingOwnerInvited);
        }
        if !group.involves(inviter) {
            return Err(GroupError::PermissionDenied(
                "Only members of the group can send invitations.".to_string(),
            ));
        }
        if inviter == invitee {
            return Err(GroupError::SelfInvite);
        }
        if group.is_member(invitee) {
            return Err(GroupError::InviteeAlreadyMember);
        }
        if already_invited {
            return Err(GroupError::AlreadyInvited);
        }

        Ok(Self {
            id: InvitationId::new_v7(),
            group_id: group.id,
            invited_user: invitee,
            invited_by: inviter,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.status == InvitationStatus::Accepted
    }

    /// Records the invitee's answer; accepting joins the group
    pub fn respond(&mut self, responder: RoommateId, accepted: bool, group: &mut Group) -> Result<(), GroupError> {
        if responder != self.invited_user {
            return Err(GroupError::PermissionDenied(
                "Only the invited user can respond to this invitation.".to_string(),
            ));
        }
        if self.status != InvitationStatus::Pending {
            return Err(GroupError::InvitationAnswered);
        }

        if accepted {
            self.status = InvitationStatus::Accepted;
            group.add_member(self.invited_user);
        } else {
            self.status = InvitationStatus::Declined;
        }
        Ok(())
    }

    /// Either side of the invitation may withdraw it
    pub fn can_delete(&self, caller: RoommateId) -> bool {
        caller == self.invited_user || caller == self.invited_by
    }
}
