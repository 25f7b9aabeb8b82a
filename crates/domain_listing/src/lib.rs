//! Listings Domain
//!
//! A landlord posts a listing with a front picture and a handful of extra
//! pictures. Tenants search listings, save favourites and open them, which
//! is recorded as an interaction for the recommender.

pub mod listing;
pub mod picture;
pub mod search;
pub mod favorites;
pub mod interaction;
pub mod error;

pub use listing::{Listing, ListingDraft, ListingPatch, PropertyType, PaymentType, LaundryType, Fees};
pub use picture::{ListingPicture, PictureSet, UploadedImage, MIN_EXTRA_PICTURES, MAX_EXTRA_PICTURES};
pub use search::{ListingQuery, RadiusFilter, SortOrder};
pub use favorites::FavoriteToggle;
pub use interaction::{InteractionKind, ListingInteraction};
pub use error::ListingError;
