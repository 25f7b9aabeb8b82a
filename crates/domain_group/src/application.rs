//! Application views
//!
//! A group that has been sent to the landlord is an application. Landlords
//! see the applications on their listings; tenants see the outcome of the
//! groups they are members of.

use serde::Serialize;

use crate::group::{Group, GroupStatus};

/// Statuses a landlord sees on their listings
pub fn is_landlord_visible(status: GroupStatus) -> bool {
    matches!(
        status,
        GroupStatus::Sent | GroupStatus::UnderReview | GroupStatus::Invited
    )
}

/// Statuses a tenant sees as answered applications
pub fn is_tenant_visible(status: GroupStatus) -> bool {
    matches!(status, GroupStatus::Rejected | GroupStatus::Invited)
}

/// Groups the caller sees as landlord and as member
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationViews {
    pub landlord: Vec<Group>,
    pub member: Vec<Group>,
}

impl ApplicationViews {
    /// # Arguments
    ///
    /// * `listing_groups` - every group on a listing the caller owns
    /// * `member_groups` - every group the caller is a member of
    pub fn build(listing_groups: Vec<Group>, member_groups: Vec<Group>) -> Self {
        Self {
            landlord: listing_groups
                .into_iter()
                .filter(|g| is_landlord_visible(g.group_status))
                .collect(),
            member: member_groups,
        }
    }

    /// Flat application list: landlord-visible groups followed by the
    /// caller's answered groups, without duplicates
    pub fn applications(&self) -> Vec<&Group> {
        let mut out: Vec<&Group> = self.landlord.iter().collect();
        for group in self.member.iter().filter(|g| is_tenant_visible(g.group_status)) {
            if !out.iter().any(|g| g.id == group.id) {
                out.push(group);
            }
        }
        out
    }
}
