//! Profile DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::{RoommateId, UserId, VerificationStatus};
use domain_account::{Sex, User};
use domain_review::RatingSummary;

/// The caller's own account
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub roommate_profile: Option<RoommateId>,
}

/// What other users see of an account
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub city: Option<String>,
    pub preferred_location: Option<String>,
    pub id_verification_status: VerificationStatus,
    pub profile_picture: Option<String>,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub roommate_profile: Option<RoommateId>,
    pub rating: RatingSummary,
    pub created_at: DateTime<Utc>,
}

impl PublicProfileResponse {
    pub fn new(user: User, roommate_profile: Option<RoommateId>, rating: RatingSummary) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            sex: user.sex,
            city: user.city,
            preferred_location: user.preferred_location,
            id_verification_status: user.id_verification_status,
            profile_picture: user.profile_picture,
            facebook_link: user.facebook_link,
            instagram_link: user.instagram_link,
            roommate_profile,
            rating,
            created_at: user.created_at,
        }
    }
}
