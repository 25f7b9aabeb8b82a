//! Request handlers

pub mod health;
pub mod auth;
pub mod profile;
pub mod listings;
pub mod roommates;
pub mod groups;
pub mod conversations;
pub mod reviews;

use chrono::{NaiveDate, Utc};

use core_kernel::UserId;
use domain_account::{AccountError, RoommateProfile};

use crate::error::ApiError;
use crate::mailer::Mail;
use crate::AppState;

/// Date used for "not in the past" checks
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The caller's roommate profile; 404 when they have none
pub(crate) async fn require_roommate(state: &AppState, user_id: UserId) -> Result<RoommateProfile, ApiError> {
    state
        .roommates()
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| AccountError::RoommateProfileMissing.into())
}

/// Sends a mail; delivery failures are logged, never surfaced to the caller
pub(crate) async fn deliver(state: &AppState, mail: Mail) {
    let to = mail.to.clone();
    if let Err(e) = state.mailer.send(mail).await {
        tracing::warn!(to = %to, error = %e, "Mail delivery failed");
    }
}
