//! Reviews domain errors

use core_kernel::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("You cannot review yourself.")]
    SelfReview,

    #[error("You have already posted a review for this user.")]
    Duplicate,

    #[error("You can only modify your own reviews.")]
    NotReviewer,

    #[error("Please provide a Reviewer/Reviewee to filter reviews by.")]
    MissingFilter,
}

impl From<FieldErrors> for ReviewError {
    fn from(errors: FieldErrors) -> Self {
        ReviewError::Validation(errors)
    }
}
