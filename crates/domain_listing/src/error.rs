//! Listings domain errors

use core_kernel::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Missing listings and listings owned by someone else look the same
    #[error("Listing not found")]
    NotFound,
}

impl From<FieldErrors> for ListingError {
    fn from(errors: FieldErrors) -> Self {
        ListingError::Validation(errors)
    }
}
