//! Listing handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::{FieldErrors, ListingId};
use domain_listing::{
    InteractionKind, Listing, ListingInteraction, ListingPicture, ListingQuery, PictureSet,
};
use domain_recommend::recommend;

use crate::auth::Claims;
use crate::dto::listing::{FavoriteResponse, ListingDetail, RecommendedListing, RecommendParams};
use crate::error::ApiError;
use crate::extract::ListingForm;
use crate::handlers::today;
use crate::AppState;

const DEFAULT_RECOMMENDATIONS: usize = 10;
const MAX_RECOMMENDATIONS: usize = 50;

/// Writes the uploads and returns the pictures to persist
///
/// Files already written are removed again when a later write fails.
async fn store_pictures(
    state: &AppState,
    listing_id: ListingId,
    pictures: PictureSet,
) -> Result<Vec<ListingPicture>, ApiError> {
    let mut stored = Vec::new();
    for (picture, upload) in pictures.layout(listing_id) {
        if let Err(e) = state.storage.save(&picture.image, &upload.data).await {
            let written: Vec<String> = stored.iter().map(|p: &ListingPicture| p.image.clone()).collect();
            state.storage.remove_all(&written).await;
            return Err(e.into());
        }
        stored.push(picture);
    }
    Ok(stored)
}

async fn detail(state: &AppState, listing: Listing, viewer: Option<&Claims>) -> Result<ListingDetail, ApiError> {
    let pictures = state.listings().pictures(listing.id).await?;
    let is_favorite = match viewer {
        Some(claims) => Some(state.favorites().is_favorite(claims.user_id(), listing.id).await?),
        None => None,
    };
    Ok(ListingDetail { listing, pictures, is_favorite })
}

/// Searches listings; see [`ListingQuery`] for the parameters
pub async fn view_all(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let query = ListingQuery::from_query(&params);
    let listings = state.listings().search(&query).await?;
    Ok(Json(listings))
}

/// Listing detail; an authenticated visit counts as a click
pub async fn get_listing(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<ListingId>,
) -> Result<Json<ListingDetail>, ApiError> {
    let listing = state.listings().get(id).await?;
    let viewer = claims.map(|Extension(c)| c);

    if let Some(claims) = viewer.as_ref().filter(|c| !listing.is_owned_by(c.user_id())) {
        let click = ListingInteraction::record(claims.user_id(), listing.id, InteractionKind::Click);
        state.interactions().record(&click).await?;
    }

    Ok(Json(detail(&state, listing, viewer.as_ref()).await?))
}

pub async fn add_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    form: ListingForm,
) -> Result<(StatusCode, Json<ListingDetail>), ApiError> {
    let mut errors = FieldErrors::new();
    if let Err(e) = form.pictures.validate_for_create() {
        errors.merge(e);
    }
    let listing = match form.draft.validate(claims.user_id(), today()) {
        Ok(listing) => Some(listing),
        Err(e) => {
            errors.merge(e);
            None
        }
    };
    let (Some(listing), true) = (listing, errors.is_empty()) else {
        return Err(errors.into());
    };

    let pictures = store_pictures(&state, listing.id, form.pictures).await?;
    if let Err(e) = state.listings().insert_with_pictures(&listing, &pictures).await {
        let paths: Vec<String> = pictures.into_iter().map(|p| p.image).collect();
        state.storage.remove_all(&paths).await;
        return Err(e.into());
    }
    info!(listing_id = %listing.id, owner = %listing.owner_id, pictures = pictures.len(), "Listing created");

    let body = detail(&state, listing, Some(&claims)).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// Owner-only edit; submitted pictures replace the front image and/or the extras
pub async fn edit_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ListingId>,
    form: ListingForm,
) -> Result<Json<ListingDetail>, ApiError> {
    let listings = state.listings();
    let mut listing = listings.get_owned(id, claims.user_id()).await?;

    let mut errors = FieldErrors::new();
    if let Err(e) = form.pictures.validate_for_update() {
        errors.merge(e);
    }
    if let Err(e) = form.draft.apply(&mut listing, today()) {
        errors.merge(e);
    }
    errors.into_result()?;

    let pictures = if form.pictures.is_empty() {
        Vec::new()
    } else {
        store_pictures(&state, listing.id, form.pictures).await?
    };
    let replaced = match listings.update_with_pictures(&listing, &pictures).await {
        Ok(replaced) => replaced,
        Err(e) => {
            let paths: Vec<String> = pictures.into_iter().map(|p| p.image).collect();
            state.storage.remove_all(&paths).await;
            return Err(e.into());
        }
    };
    state.storage.remove_all(&replaced).await;
    info!(listing_id = %listing.id, pictures = pictures.len(), "Listing updated");

    Ok(Json(detail(&state, listing, Some(&claims)).await?))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ListingId>,
) -> Result<StatusCode, ApiError> {
    let listings = state.listings();
    let listing = listings.get_owned(id, claims.user_id()).await?;
    let paths = listings.delete(listing.id).await?;
    state.storage.remove_all(&paths).await;

    info!(listing_id = %listing.id, "Listing deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ListingId>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let listing = state.listings().get(id).await?;
    let toggle = state.favorites().toggle(claims.user_id(), listing.id).await?;
    Ok(Json(toggle.into()))
}

pub async fn favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.favorites().list(claims.user_id()).await?))
}

/// Listings ranked for the caller by the configured scorer
pub async fn recommended(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<RecommendedListing>>, ApiError> {
    let user = state.users().get(claims.user_id()).await?;
    let candidates = state.listings().list_all().await?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS);

    let ranked = recommend(state.scorer.as_ref(), &user, candidates, limit).await;
    Ok(Json(
        ranked
            .into_iter()
            .map(|(listing, score)| RecommendedListing { listing, score })
            .collect(),
    ))
}
