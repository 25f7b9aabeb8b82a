//! Favourite toggling

use serde::Serialize;

/// Outcome of toggling a listing in a user's favourites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

impl FavoriteToggle {
    /// Toggle result given whether the listing is currently a favourite
    pub fn from_current(is_favorite: bool) -> Self {
        if is_favorite {
            FavoriteToggle::Removed
        } else {
            FavoriteToggle::Added
        }
    }

    pub fn is_favorite(&self) -> bool {
        matches!(self, FavoriteToggle::Added)
    }

    pub fn message(&self) -> &'static str {
        match self {
            FavoriteToggle::Added => "Listing added to favorites.",
            FavoriteToggle::Removed => "Listing removed from favorites.",
        }
    }
}
