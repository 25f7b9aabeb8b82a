//! Review aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{define_code_enum, FieldErrors, ReviewId, UserId};

use crate::error::ReviewError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

define_code_enum!(
    RevieweeRole {
        Tenant => "T",
        Landlord => "L",
        Roommate => "R",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewee_role: RevieweeRole,
    pub created_at: DateTime<Utc>,
}

fn check_rating(errors: &mut FieldErrors, rating: i32) {
    errors.check(
        (MIN_RATING..=MAX_RATING).contains(&rating),
        "rating",
        format!("Ensure this value is between {} and {}.", MIN_RATING, MAX_RATING),
    );
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub reviewee_role: Option<RevieweeRole>,
}

impl ReviewDraft {
    /// Validates a review of `reviewee` written by `reviewer`
    ///
    /// `already_reviewed` tells whether the pair already has a review.
    pub fn validate(
        self,
        reviewer: UserId,
        reviewee: UserId,
        already_reviewed: bool,
    ) -> Result<Review, ReviewError> {
        if reviewer == reviewee {
            return Err(ReviewError::SelfReview);
        }

        let mut errors = FieldErrors::new();
        match self.rating {
            Some(rating) => check_rating(&mut errors, rating),
            None => errors.required("rating"),
        }
        if self.reviewee_role.is_none() {
            errors.required("reviewee_role");
        }

        let (Some(rating), Some(reviewee_role), true) = (self.rating, self.reviewee_role, errors.is_empty()) else {
            return Err(errors.into());
        };
        if already_reviewed {
            return Err(ReviewError::Duplicate);
        }

        Ok(Review {
            id: ReviewId::new_v7(),
            reviewer_id: reviewer,
            reviewee_id: reviewee,
            rating,
            comment: self.comment,
            reviewee_role,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub reviewee_role: Option<RevieweeRole>,
}

impl Review {
    pub fn ensure_reviewer(&self, caller: UserId) -> Result<(), ReviewError> {
        if self.reviewer_id == caller {
            Ok(())
        } else {
            Err(ReviewError::NotReviewer)
        }
    }

    /// Applies an edit made by `caller`
    pub fn apply(&mut self, caller: UserId, patch: ReviewPatch) -> Result<(), ReviewError> {
        self.ensure_reviewer(caller)?;

        if let Some(rating) = patch.rating {
            let mut errors = FieldErrors::new();
            check_rating(&mut errors, rating);
            errors.into_result()?;
            self.rating = rating;
        }
        if patch.comment.is_some() {
            self.comment = patch.comment;
        }
        if let Some(role) = patch.reviewee_role {
            self.reviewee_role = role;
        }
        Ok(())
    }
}

/// `/reviews` list filter; at least one side is required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewFilter {
    pub reviewer: Option<UserId>,
    pub reviewee: Option<UserId>,
}

impl ReviewFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ReviewError> {
        let id = |key: &str| params.get(key).and_then(|v| v.trim().parse::<UserId>().ok());
        let filter = Self {
            reviewer: id("reviewer"),
            reviewee: id("reviewee"),
        };
        if filter.reviewer.is_none() && filter.reviewee.is_none() {
            return Err(ReviewError::MissingFilter);
        }
        Ok(filter)
    }
}

/// Average rating and review count for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub user_id: UserId,
    pub count: usize,
    /// Rounded to two decimal places; `None` without reviews
    pub average: Option<Decimal>,
}

impl RatingSummary {
    pub fn from_reviews(user_id: UserId, reviews: &[Review]) -> Self {
        let ratings: Vec<i32> = reviews
            .iter()
            .filter(|r| r.reviewee_id == user_id)
            .map(|r| r.rating)
            .collect();
        let count = ratings.len();
        let average = (count > 0).then(|| {
            let total: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
            (Decimal::from(total) / Decimal::from(count as i64)).round_dp(2)
        });
        Self { user_id, count, average }
    }
}
