//! Group and invitation DTOs

use serde::{Deserialize, Serialize};

use core_kernel::RoommateId;
use domain_group::GroupInvitation;

#[derive(Debug, Default, Deserialize)]
pub struct ManageGroupRequest {
    pub group_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub invited_user: RoommateId,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvitationAnswer {
    pub accepted: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct InvitationLists {
    pub received: Vec<GroupInvitation>,
    pub sent: Vec<GroupInvitation>,
}
