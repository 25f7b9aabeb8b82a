//! Review handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::{ReviewId, UserId};
use domain_review::{Review, ReviewDraft, ReviewFilter, ReviewPatch};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::AppState;

/// Reviews the user `id`
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<UserId>,
    AppJson(draft): AppJson<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let reviewee = state.users().get(id).await?;
    let reviews = state.reviews();
    let already_reviewed = reviews.exists(claims.user_id(), reviewee.id).await?;

    let review = draft.validate(claims.user_id(), reviewee.id, already_reviewed)?;
    reviews.insert(&review).await?;
    info!(review_id = %review.id, reviewee = %reviewee.id, rating = review.rating, "Review posted");

    Ok((StatusCode::CREATED, Json(review)))
}

/// Lists reviews by `reviewer` and/or `reviewee`
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let filter = ReviewFilter::from_query(&params)?;
    Ok(Json(state.reviews().list(&filter).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>, ApiError> {
    Ok(Json(state.reviews().get(id).await?))
}

pub async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ReviewId>,
    AppJson(patch): AppJson<ReviewPatch>,
) -> Result<Json<Review>, ApiError> {
    let reviews = state.reviews();
    let mut review = reviews.get(id).await?;

    review.apply(claims.user_id(), patch)?;
    reviews.update(&review).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode, ApiError> {
    let reviews = state.reviews();
    let review = reviews.get(id).await?;
    review.ensure_reviewer(claims.user_id())?;

    reviews.delete(review.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
