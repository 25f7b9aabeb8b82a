//! Listing DTOs

use serde::{Deserialize, Serialize};

use domain_listing::{FavoriteToggle, Listing, ListingPicture};

#[derive(Debug, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub pictures: Vec<ListingPicture>,
    /// Only set for authenticated callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub status: FavoriteToggle,
    pub is_favorite: bool,
    pub message: String,
}

impl From<FavoriteToggle> for FavoriteResponse {
    fn from(toggle: FavoriteToggle) -> Self {
        Self {
            status: toggle,
            is_favorite: toggle.is_favorite(),
            message: toggle.message().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub score: f64,
}
