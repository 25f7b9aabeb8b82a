//! Groups domain errors

use core_kernel::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Group not found")]
    NotFound,

    #[error("{0}")]
    InvalidStatus(String),

    #[error("You are already a member of this group.")]
    AlreadyMember,

    #[error("You are not a member of this group.")]
    NotMember,

    #[error("This group is not accepting new members.")]
    NotAccepting,

    #[error("The owner of the listing cannot be invited.")]
    ListingOwnerInvited,

    #[error("You cannot invite yourself.")]
    SelfInvite,

    #[error("This user is already a member of the group.")]
    InviteeAlreadyMember,

    #[error("This user has already been invited to this group.")]
    AlreadyInvited,

    #[error("This invitation has already been answered.")]
    InvitationAnswered,

    #[error("{0}")]
    PermissionDenied(String),
}

impl From<FieldErrors> for GroupError {
    fn from(errors: FieldErrors) -> Self {
        GroupError::Validation(errors)
    }
}
