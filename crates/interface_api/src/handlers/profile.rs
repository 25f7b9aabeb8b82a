//! Profile handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::UserId;
use domain_account::password::hash_password;
use domain_account::ProfileUpdate;
use domain_listing::ListingQuery;
use domain_review::{RatingSummary, ReviewFilter};

use crate::auth::Claims;
use crate::dto::profile::{ProfileResponse, PublicProfileResponse};
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::AppState;

async fn own_profile(state: &AppState, user_id: UserId) -> Result<ProfileResponse, ApiError> {
    let user = state.users().get(user_id).await?;
    let roommate_profile = state.roommates().find_by_user(user_id).await?.map(|r| r.id);
    Ok(ProfileResponse { user, roommate_profile })
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    Ok(Json(own_profile(&state, claims.user_id()).await?))
}

/// Another user's public profile with their rating summary
pub async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    let user = state.users().get(id).await?;
    let roommate_profile = state.roommates().find_by_user(id).await?.map(|r| r.id);
    let filter = ReviewFilter { reviewer: None, reviewee: Some(id) };
    let reviews = state.reviews().list(&filter).await?;
    let rating = RatingSummary::from_reviews(id, &reviews);

    Ok(Json(PublicProfileResponse::new(user, roommate_profile, rating)))
}

pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let users = state.users();
    let mut user = users.get(claims.user_id()).await?;

    let email_taken = match update.changed_email(&user) {
        Some(email) => users.email_taken(&email, Some(user.id)).await?,
        None => false,
    };
    if let Some(password) = update.apply(&mut user, email_taken)? {
        user.password_hash = hash_password(&password)?;
    }
    users.update(&user).await?;
    info!(user_id = %user.id, "Profile updated");

    Ok(Json(own_profile(&state, user.id).await?))
}

/// Deletes the account and every picture of the caller's listings
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let user_id = claims.user_id();
    let listings = state.listings();
    let owned = listings
        .search(&ListingQuery { owner: Some(user_id), ..ListingQuery::default() })
        .await?;

    let mut paths = Vec::new();
    for listing in owned {
        paths.extend(listings.delete(listing.id).await?);
    }
    state.users().delete(user_id).await?;
    state.storage.remove_all(&paths).await;

    info!(user_id = %user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
