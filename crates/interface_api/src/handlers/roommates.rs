//! Roommate profile handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::RoommateId;
use domain_account::{AccountError, RoommateDraft, RoommateFilter, RoommatePatch, RoommateProfile};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::AppState;

/// Lists profiles matching the query flags, never the caller's own
pub async fn list_roommates(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<RoommateProfile>>, ApiError> {
    let caller = claims.map(|Extension(c)| c.user_id());
    let filter = RoommateFilter::from_query(&params);
    let profiles = state.roommates().list_excluding(caller).await?;

    Ok(Json(profiles.into_iter().filter(|p| filter.matches(p)).collect()))
}

pub async fn get_roommate(
    State(state): State<AppState>,
    Path(id): Path<RoommateId>,
) -> Result<Json<RoommateProfile>, ApiError> {
    Ok(Json(state.roommates().get(id).await?))
}

/// Publishes the caller's roommate profile; one per user
pub async fn create_roommate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(draft): AppJson<RoommateDraft>,
) -> Result<(StatusCode, Json<RoommateProfile>), ApiError> {
    let roommates = state.roommates();
    if roommates.find_by_user(claims.user_id()).await?.is_some() {
        return Err(AccountError::RoommateProfileExists.into());
    }

    let profile = draft.validate(claims.user_id())?;
    roommates.insert(&profile).await?;
    info!(roommate_id = %profile.id, user_id = %profile.user_id, "Roommate profile created");

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Edits a profile; anyone but its owner is told it does not exist
pub async fn edit_roommate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<RoommateId>,
    AppJson(patch): AppJson<RoommatePatch>,
) -> Result<Json<RoommateProfile>, ApiError> {
    let roommates = state.roommates();
    let mut profile = roommates.get(id).await?;
    if profile.user_id != claims.user_id() {
        return Err(ApiError::not_found("Roommate profile"));
    }

    patch.apply(&mut profile)?;
    roommates.update(&profile).await?;
    Ok(Json(profile))
}
